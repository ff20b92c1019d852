//! Script-content escaping.
//!
//! Inline script text is parsed by the HTML tokeniser before the JavaScript
//! engine ever sees it. Two byte sequences can break out of script-data
//! state: `</` (an end-tag open, which closes the element no matter what
//! follows inside the script) and `<!--` (which enters the script-data
//! escaped state and changes how a later `</script>` is matched). Both are
//! neutralised with a backslash that is a no-op in JavaScript source,
//! string literals, and regex literals alike.

/// Escape `source` for embedding as inline `<script>` content.
///
/// Every occurrence of `</` becomes `<\/` and every occurrence of `<!--`
/// becomes `<\!--`. Replacing all `</`, not just `</script`, also covers
/// mixed-case closers like `</ScRiPt>`.
pub fn escape_script(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 8);
    let mut rest = source;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("</") {
            out.push_str("<\\/");
            rest = after;
        } else if let Some(after) = tail.strip_prefix("<!--") {
            out.push_str("<\\!--");
            rest = after;
        } else {
            out.push('<');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_tag_open_is_neutralised() {
        assert_eq!(
            escape_script("alert('</script>')"),
            "alert('<\\/script>')"
        );
    }

    #[test]
    fn test_comment_open_is_neutralised() {
        assert_eq!(escape_script("x = '<!-- hi'"), "x = '<\\!-- hi'");
    }

    #[test]
    fn test_casing_cannot_slip_through() {
        let escaped = escape_script("'</ScRiPt><SCRIPT>'");
        let lower = escaped.to_ascii_lowercase();
        assert!(!lower.contains("</script"));
        assert!(escaped.contains("<SCRIPT>"));
    }

    #[test]
    fn test_plain_comparisons_untouched() {
        assert_eq!(escape_script("if (a < b && c > d) {}"), "if (a < b && c > d) {}");
    }

    #[test]
    fn test_no_breakout_sequences_survive() {
        let hostile = "</script><script>alert(1)</script><!--<<//</";
        let escaped = escape_script(hostile);
        assert!(!escaped.contains("<!--"));
        assert!(!escaped.contains("</"));
        assert_eq!(
            escaped,
            "<\\/script><script>alert(1)<\\/script><\\!--<<\\//<\\/"
        );
    }
}
