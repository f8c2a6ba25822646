//! Converts post bodies from Markdown to HTML.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// Converts `markdown` to HTML, appending the result to `out`.
///
/// Headings in the post body are demoted one level so they sit beneath the
/// post title (the page's `h1`): `#` becomes `h2`, `##` becomes `h3`, etc.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(markdown, options).map(|ev| match ev {
        Event::Start(Tag::Heading(level)) => Event::Start(Tag::Heading(demote(level))),
        Event::End(Tag::Heading(level)) => Event::End(Tag::Heading(demote(level))),
        _ => ev,
    });
    html::push_html(out, events);
}

fn demote(level: u32) -> u32 {
    (level + 1).min(6)
}
