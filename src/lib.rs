//! htmlgrid - Converts HTML tables into styled spreadsheet grids
//!
//! This library lays out HTML tables, including malformed and deeply nested
//! ones, as a rectangular grid of cells and writes the grid to a spreadsheet
//! sink with merged ranges, fonts, fills, borders, alignment, column widths
//! and row heights.
//!
//! # Features
//!
//! - **Span resolution**: `rowspan`/`colspan` with overlap repair; no cell is
//!   ever written twice and every grid position has exactly one owner
//! - **Nested tables**: child tables are spliced into their host cell's row
//!   and column space down to a configurable depth
//! - **Inline CSS**: fonts, colors, borders, alignment and widths from
//!   `style` attributes and legacy presentational attributes
//! - **Streaming output**: rows reach the sink in bounded chunks
//! - **XLSX**: a single-sheet workbook writer with deduplicated styles
//! - **Soft failure**: malformed input degrades locally and is counted in a
//!   [`ConversionReport`] instead of aborting the conversion
//!
//! # Example - Converting to a file
//!
//! ```no_run
//! use htmlgrid::{ConvertOptions, Converter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::new(ConvertOptions::default())?;
//! let html = std::fs::read_to_string("report.html")?;
//!
//! let report = converter.convert_to_file(&html, "report.xlsx")?;
//! println!("{} tables, {} merges", report.tables, report.merges);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inspecting the layout
//!
//! ```
//! use htmlgrid::{ConvertOptions, Converter, MemorySink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::new(ConvertOptions::default().with_max_nested_depth(1))?;
//! let mut sink = MemorySink::new();
//! converter.convert_with_sink(
//!     "<table><tr><td rowspan=2>a</td><td>b</td></tr><tr><td>c</td></tr></table>",
//!     &mut sink,
//! )?;
//!
//! assert_eq!(sink.text(0, 0), Some("a"));
//! assert_eq!(sink.text(1, 1), Some("c"));
//! assert_eq!(sink.merges.ranges()[0].to_string(), "A1:A2");
//! # Ok(())
//! # }
//! ```

/// Shared error types, CSS value parsing and XML helpers
pub mod common;

/// Conversion options
pub mod config;

/// The conversion pipeline
pub mod converter;

/// Grid emission and output sinks
pub mod emit;

/// HTML input: document splitting and table extraction
pub mod html;

/// Office Open XML output
pub mod ooxml;

/// Conversion statistics
pub mod report;

/// Inline style normalization and the per-conversion caches
pub mod style;

/// Table layout: span resolution and nested table splicing
pub mod table;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use config::ConvertOptions;
pub use converter::{Conversion, Converter};
pub use emit::{GridEmitter, MemorySink, MergeRange, SheetSink};
pub use ooxml::XlsxSink;
pub use report::{ConversionReport, Degradation, DegradationCounts};
pub use style::{CellStyle, StyleCache};
pub use table::{Grid, NestedTableResolver, TableMatrixBuilder};
