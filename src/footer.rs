//! The footer shown at the bottom of every page.

use chrono::{Datelike, Local};

use crate::util::escape;

const THEME_NAME: &str = "zoomkoding-gatsby-blog";
const THEME_URL: &str = "https://github.com/Baek2back/Baek2back.github.io";

/// A copyright line crediting `author` (linked to `github_url`) and the
/// theme.
#[derive(Clone, Copy, Debug)]
pub struct PageFooter<'a> {
    pub author: &'a str,
    pub github_url: &'a str,
}

impl PageFooter<'_> {
    /// Renders the footer for the current year.
    pub fn render(&self) -> String {
        self.render_for_year(Local::now().year())
    }

    pub fn render_for_year(&self, year: i32) -> String {
        format!(
            concat!(
                r#"<footer class="page-footer-wrapper"><p class="page-footer">"#,
                r#"© {}&nbsp;<a href="{}">{}</a>&nbsp;powered by"#,
                r#"<a href="{}">&nbsp;{}</a></p></footer>"#,
            ),
            year,
            escape(self.github_url),
            escape(self.author),
            THEME_URL,
            THEME_NAME,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_for_year() {
        let footer = PageFooter {
            author: "Kim & Co",
            github_url: "https://github.com/someone",
        };
        assert_eq!(
            concat!(
                r#"<footer class="page-footer-wrapper"><p class="page-footer">"#,
                r#"© 2021&nbsp;<a href="https://github.com/someone">Kim &amp; Co</a>"#,
                r#"&nbsp;powered by<a href="https://github.com/Baek2back/Baek2back.github.io">"#,
                r#"&nbsp;zoomkoding-gatsby-blog</a></p></footer>"#,
            ),
            footer.render_for_year(2021)
        );
    }

    #[test]
    fn test_render_uses_current_year() {
        let footer = PageFooter {
            author: "a",
            github_url: "b",
        };
        let year = Local::now().year().to_string();
        assert!(footer.render().contains(&format!("© {}&nbsp;", year)));
    }
}
