//! Office Open XML (OOXML) output.
//!
//! Only the spreadsheet flavor is written: see [`xlsx`].

pub mod xlsx;

pub use xlsx::XlsxSink;
