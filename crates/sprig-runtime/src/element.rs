//! The produced `<script>` element.

use std::fmt;

/// An inline script element ready for embedding in server-rendered HTML.
///
/// The element's only content is the raw, already escaped script source; no
/// `src`, `type`, or `async` attributes are set, so the browser executes it
/// synchronously during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    inner_html: String,
}

impl ScriptElement {
    pub(crate) fn new(inner_html: String) -> Self {
        Self { inner_html }
    }

    pub fn tag_name(&self) -> &'static str {
        "script"
    }

    /// The escaped script source.
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// Serialise to an HTML string for direct embedding.
    pub fn to_html(&self) -> String {
        format!("<{tag}>{}</{tag}>", self.inner_html, tag = self.tag_name())
    }
}

impl fmt::Display for ScriptElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_rendering() {
        let element = ScriptElement::new("(() => {})()".to_string());
        assert_eq!(element.tag_name(), "script");
        assert_eq!(element.to_html(), "<script>(() => {})()</script>");
        assert_eq!(element.to_string(), element.to_html());
    }
}
