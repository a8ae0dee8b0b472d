//! HTML input handling.
//!
//! Splits a payload into documents, parses each with `scraper` and copies
//! its tables into an owned tree the layout engine can share across threads.

pub mod document;
pub mod extract;
pub mod node;

pub use document::split_documents;
pub use extract::{MAX_COLSPAN, MAX_ROWSPAN, TableExtractor};
pub use node::{CellBlock, CellKind, CellNode, RowNode, StyleAttributes, TableId, TableNode};
