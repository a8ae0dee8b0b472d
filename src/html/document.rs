//! Splitting an input blob into HTML documents.
//!
//! Upstream report generators often concatenate several complete pages into
//! one payload. Each `</html>` closes a document; text after the last one is
//! a document of its own if it holds anything but whitespace.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

static DOCUMENT_END: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(["</html>"])
        .expect("Failed to build document splitter")
});

/// Split `input` after every `</html>`, dropping blank segments.
///
/// # Examples
///
/// ```
/// use htmlgrid::html::split_documents;
///
/// let docs = split_documents("<html>a</html>\n<HTML>b</HTML>  ");
/// assert_eq!(docs, vec!["<html>a</html>", "\n<HTML>b</HTML>"]);
///
/// assert_eq!(split_documents("<table></table>").len(), 1);
/// assert!(split_documents("  \n").is_empty());
/// ```
pub fn split_documents(input: &str) -> Vec<&str> {
    let mut documents = Vec::new();
    let mut start = 0;

    for found in DOCUMENT_END.find_iter(input) {
        let segment = &input[start..found.end()];
        if !segment.trim().is_empty() {
            documents.push(segment);
        }
        start = found.end();
    }

    let rest = &input[start..];
    if !rest.trim().is_empty() {
        documents.push(rest);
    }

    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_document_without_closing_tag() {
        assert_eq!(split_documents("<p>x</p>"), vec!["<p>x</p>"]);
    }

    #[test]
    fn test_trailing_fragment_is_a_document() {
        let docs = split_documents("<html></html><table><tr><td>1</td></tr></table>");
        assert_eq!(docs.len(), 2);
        assert!(docs[1].starts_with("<table>"));
    }

    #[test]
    fn test_every_closing_tag_ends_a_document() {
        let docs = split_documents("</html></html><html>x</html>\n\t");
        assert_eq!(docs, vec!["</html>", "</html>", "<html>x</html>"]);
        assert!(split_documents("").is_empty());
    }
}
