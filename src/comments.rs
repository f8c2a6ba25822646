//! Renders the loader for the [utterances](https://utteranc.es) comment
//! widget, which backs each post's comment thread with a GitHub issue.

use crate::document::{has_class_of_body, Document};
use crate::util::escape;

const SRC: &str = "https://utteranc.es/client.js";
const BRANCH: &str = "master";
const LABEL: &str = "comment";
const ISSUE_TERM: &str = "pathname";
const DARK_THEME: &str = "photon-dark";
const LIGHT_THEME: &str = "github-light";

/// The utterances widget for a GitHub repository (`owner/name`).
#[derive(Clone, Copy, Debug)]
pub struct Utterances<'a> {
    repo: &'a str,
}

impl<'a> Utterances<'a> {
    /// Returns `None` when `repo` is blank; there is nothing to load comments
    /// from.
    pub fn new(repo: &'a str) -> Option<Utterances<'a>> {
        let repo = repo.trim();
        if repo.is_empty() {
            None
        } else {
            Some(Utterances { repo })
        }
    }

    /// The widget theme follows the page: dark when the document body has
    /// the `dark` class.
    pub fn theme<D: Document + ?Sized>(document: &D) -> &'static str {
        if has_class_of_body(document, "dark") {
            DARK_THEME
        } else {
            LIGHT_THEME
        }
    }

    /// The attributes of the loader `<script>` element, in the order they
    /// are written.
    pub fn attributes<D: Document + ?Sized>(&self, document: &D) -> Vec<(&'static str, &'a str)> {
        vec![
            ("src", SRC),
            ("repo", self.repo),
            ("branch", BRANCH),
            ("theme", Self::theme(document)),
            ("label", LABEL),
            ("async", "true"),
            ("issue-term", ISSUE_TERM),
            ("crossorigin", "anonymous"),
        ]
    }

    /// Renders the widget's mount point with the loader script inside it.
    pub fn render<D: Document + ?Sized>(&self, document: &D) -> String {
        let mut out = String::from(r#"<div class="utterances"><script"#);
        for (key, value) in self.attributes(document) {
            out.push_str(&format!(r#" {}="{}""#, key, escape(value)));
        }
        out.push_str("></script></div>");
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::StaticDocument;

    #[test]
    fn test_blank_repo_disables_widget() {
        assert!(Utterances::new("").is_none());
        assert!(Utterances::new("  ").is_none());
    }

    #[test]
    fn test_theme_follows_body_class() {
        assert_eq!("photon-dark", Utterances::theme(&StaticDocument::themed(true)));
        assert_eq!("github-light", Utterances::theme(&StaticDocument::themed(false)));
    }

    #[test]
    fn test_attributes() {
        let widget = Utterances::new("owner/blog").unwrap();
        assert_eq!(
            vec![
                ("src", "https://utteranc.es/client.js"),
                ("repo", "owner/blog"),
                ("branch", "master"),
                ("theme", "github-light"),
                ("label", "comment"),
                ("async", "true"),
                ("issue-term", "pathname"),
                ("crossorigin", "anonymous"),
            ],
            widget.attributes(&StaticDocument::themed(false))
        );
    }

    #[test]
    fn test_render() {
        let widget = Utterances::new("owner/\"blog\"").unwrap();
        assert_eq!(
            concat!(
                r#"<div class="utterances"><script src="https://utteranc.es/client.js""#,
                r#" repo="owner/&quot;blog&quot;" branch="master" theme="photon-dark""#,
                r#" label="comment" async="true" issue-term="pathname""#,
                r#" crossorigin="anonymous"></script></div>"#,
            ),
            widget.render(&StaticDocument::themed(true))
        );
    }
}
