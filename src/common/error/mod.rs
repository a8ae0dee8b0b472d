//! Unified error types for htmlgrid.
//!
//! This module provides the single error type returned by every fallible
//! operation of the crate, presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
