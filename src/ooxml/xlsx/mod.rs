//! Excel (.xlsx) workbook output.
//!
//! A minimal SpreadsheetML writer: one worksheet, a shared strings table and
//! a deduplicated style table, packaged as an OPC ZIP archive.
//!
//! - `format`: font, fill, border and alignment records of the style table
//! - `writer`: XML generation of the workbook parts and the ZIP package
//! - `sink`: [`XlsxSink`], the [`SheetSink`](crate::emit::SheetSink) on top

pub mod format;
pub mod sink;
pub mod writer;

pub use format::CellFormat;
pub use sink::XlsxSink;
