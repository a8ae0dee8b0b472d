//! Worksheet, style and package writer components for XLSX.

pub mod sheet;
pub mod strings;
pub mod styles;
pub mod workbook;

// Re-export main types
pub use sheet::StreamingWorksheet;
pub use strings::MutableSharedStrings;
pub use styles::StylesBuilder;
pub use workbook::PackageWriter;
