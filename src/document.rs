//! A minimal, injectable view of the rendered document. Components that need
//! to inspect the page (e.g., whether the body is in dark mode) take a
//! [`Document`] instead of reaching for global state, so they can be rendered
//! at build time or tested without a browser.

/// An element with a tag name and a class list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
}

impl Element {
    pub fn new(tag: &str) -> Element {
        Element {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
        }
    }

    /// Adds `class` to the element's class list unless it's already there.
    pub fn with_class(mut self, class: &str) -> Element {
        if !self.classes.iter().any(|c| c == class) {
            self.classes.push(class.to_owned());
        }
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn class_list(&self) -> &[String] {
        &self.classes
    }

    /// Matches simple selectors only: a tag name (`body`) or a class
    /// (`.dark`).
    pub fn matches(&self, selector: &str) -> bool {
        match selector.strip_prefix('.') {
            Some(class) => has_class(self, class),
            None => self.tag.eq_ignore_ascii_case(selector),
        }
    }
}

/// Read access to a document's elements.
pub trait Document {
    /// Returns the first element matching `selector`, if any.
    fn element(&self, selector: &str) -> Option<&Element>;
}

pub fn get_element<'d, D: Document + ?Sized>(
    document: &'d D,
    selector: &str,
) -> Option<&'d Element> {
    document.element(selector.trim())
}

pub fn get_body<D: Document + ?Sized>(document: &D) -> Option<&Element> {
    get_element(document, "body")
}

pub fn has_class(element: &Element, class: &str) -> bool {
    element.class_list().iter().any(|c| c == class)
}

/// Reports whether the document's body has `class`. A document without a
/// body has no classes.
pub fn has_class_of_body<D: Document + ?Sized>(document: &D, class: &str) -> bool {
    get_body(document).map_or(false, |body| has_class(body, class))
}

/// The document as it's known at build time: an `html` root and a `body`
/// carrying the theme's classes.
#[derive(Clone, Debug)]
pub struct StaticDocument {
    elements: Vec<Element>,
}

impl StaticDocument {
    pub fn new(body: Element) -> StaticDocument {
        StaticDocument {
            elements: vec![Element::new("html"), body],
        }
    }

    /// A document whose body has the `dark` class when `dark` is set.
    pub fn themed(dark: bool) -> StaticDocument {
        let body = Element::new("body");
        StaticDocument::new(if dark { body.with_class("dark") } else { body })
    }
}

impl Document for StaticDocument {
    fn element(&self, selector: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.matches(selector))
    }
}
