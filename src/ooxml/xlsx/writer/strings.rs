/// Shared strings table for XLSX workbooks.
use crate::common::Result;
use crate::common::xml::escape_xml_text;
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// Mutable shared strings table.
///
/// Excel stores frequently used strings in a shared table to reduce file size.
/// This structure manages the collection of unique strings and their indices.
#[derive(Debug)]
pub struct MutableSharedStrings {
    /// List of unique strings
    pub(crate) strings: Vec<String>,
    /// Map from string to index for fast lookup
    pub(crate) string_to_index: HashMap<String, usize>,
    /// Cell references to the table, duplicates included
    references: usize,
}

impl MutableSharedStrings {
    /// Create a new empty shared strings table.
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            string_to_index: HashMap::new(),
            references: 0,
        }
    }

    /// Add a string to the shared strings table and return its index.
    ///
    /// If the string already exists, returns the existing index.
    pub fn add_string(&mut self, s: &str) -> usize {
        self.references += 1;
        if let Some(&index) = self.string_to_index.get(s) {
            index
        } else {
            let index = self.strings.len();
            self.strings.push(s.to_string());
            self.string_to_index.insert(s.to_string(), index);
            index
        }
    }

    /// Get the number of unique strings.
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    /// Serialize the shared strings table to XML.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(4096 + self.strings.len() * 16);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);

        write!(
            xml,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.strings.len()
        )?;

        for s in &self.strings {
            // Leading or trailing whitespace and line breaks survive only
            // with xml:space="preserve"
            if needs_preserve(s) {
                write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml_text(s))?;
            } else {
                write!(xml, "<si><t>{}</t></si>", escape_xml_text(s))?;
            }
        }

        xml.push_str("</sst>");

        Ok(xml)
    }
}

fn needs_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) || s.contains('\n')
}

impl Default for MutableSharedStrings {
    fn default() -> Self {
        Self::new()
    }
}
