//! Table layout.
//!
//! [`TableMatrixBuilder`] turns one extracted table into a [`Grid`];
//! [`NestedTableResolver`] does the same for a table and everything nested
//! inside it, splicing child grids into the parent's row and column space.

// Submodule declarations
pub mod builder;
pub mod grid;
pub mod nested;

// Re-exports for convenience
pub use builder::TableMatrixBuilder;
pub use grid::{CellOrigin, CellRef, Grid, OriginId};
pub use nested::{NestedTableRef, NestedTableResolver};
