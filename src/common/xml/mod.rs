//! XML text helpers shared by the spreadsheet writer.

pub mod escape;

pub use escape::{escape_xml, escape_xml_text};
