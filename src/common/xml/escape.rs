use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape XML special characters.
///
/// # Examples
///
/// ```
/// use htmlgrid::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<tag>\"hello\"</tag>"), "&lt;tag&gt;&quot;hello&quot;&lt;/tag&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Whether `c` may appear in an XML 1.0 document.
#[inline]
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Escape text for an element body, dropping characters XML 1.0 forbids.
///
/// HTML happily carries control characters (form feeds, stray NULs from
/// upstream exporters) that would make the spreadsheet unreadable.
///
/// # Examples
///
/// ```
/// use htmlgrid::common::xml::escape_xml_text;
/// assert_eq!(escape_xml_text("a\u{0c}<b>"), "a&lt;b&gt;");
/// ```
pub fn escape_xml_text(s: &str) -> String {
    if s.chars().all(is_xml_char) {
        return escape_xml(s);
    }
    let cleaned: String = s.chars().filter(|&c| is_xml_char(c)).collect();
    escape_xml(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml_text_strips_controls() {
        assert_eq!(escape_xml_text("ok"), "ok");
        assert_eq!(escape_xml_text("x\u{0}y\u{1b}z"), "xyz");
        assert_eq!(escape_xml_text("tab\tnew\nline"), "tab\tnew\nline");
        assert_eq!(escape_xml_text("\u{FFFE}&"), "&amp;");
    }
}
