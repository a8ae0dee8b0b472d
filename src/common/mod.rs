//! Common types, traits, and utilities shared across the converter.
//!
//! Errors, CSS value parsing and XML text helpers used by both the layout
//! engine and the spreadsheet writer.

// Submodule declarations
pub mod color;
pub mod error;
pub mod unit;
pub mod xml;

// Re-exports for convenience
pub use color::{RGBColor, normalize_color};
pub use error::{Error, Result};
pub use unit::{CssLength, CssUnit};
