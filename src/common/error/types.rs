//! Unified error types for htmlgrid.
//!
//! Only failures that abort a conversion live here. Soft degradations of
//! malformed input are counted in the conversion report instead; the
//! variants a sink returns for them ([`Error::MergeConflict`] and
//! [`Error::OutOfRange`]) are recovered by the emitter.
use thiserror::Error;

use crate::emit::MergeRange;

/// Main error type for htmlgrid operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input contained no renderable table and the caller required one
    #[error("No tables found in input")]
    NoTablesFound,

    /// The output sink could not be created, written or closed
    #[error("Sink error: {0}")]
    Sink(String),

    /// A merge range overlaps a range the sink already holds.
    ///
    /// Returned by [`SheetSink::merge_cells`](crate::emit::SheetSink::merge_cells);
    /// the emitter recovers by writing the origin cell alone.
    #[error("Merge conflict at {0}")]
    MergeConflict(MergeRange),

    /// A position past the last row or column the sink can hold (0-based)
    #[error("Position row {row}, column {col} is outside the sheet")]
    OutOfRange { row: u32, col: u32 },

    /// XML generation error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error came from the output side rather than the input.
    pub fn is_sink_failure(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Sink(_) | Error::XmlError(_) | Error::ZipError(_)
        )
    }
}

/// Result type for htmlgrid operations.
pub type Result<T> = std::result::Result<T, Error>;
