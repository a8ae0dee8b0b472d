//! Grid emission.
//!
//! [`GridEmitter`] writes resolved grids to any [`SheetSink`] in bounded
//! chunks and derives column widths from what it writes. [`MemorySink`]
//! records the result in memory; the XLSX sink lives in
//! [`crate::ooxml::xlsx`].

// Submodule declarations
pub mod emitter;
pub mod memory;
pub mod sink;
pub mod width;

// Re-exports for convenience
pub use emitter::{EmitSummary, GridEmitter};
pub use memory::{MemoryCell, MemorySink};
pub use sink::{
    FormatHandle, MergeIndex, MergeRange, SHEET_MAX_COLS, SHEET_MAX_ROWS, SheetSink, cell_reference,
    column_letters,
};
pub use width::{ColumnWidthAccumulator, estimate_cell_width};
