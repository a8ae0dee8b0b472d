//! Cell style resolution.
//!
//! Inline `style` attributes and presentational HTML attributes are parsed
//! into [`StyleProperties`], resolved into a hashable [`CellStyle`] and
//! memoized in a per-conversion [`StyleCache`].

// Submodule declarations
pub mod cache;
pub mod cell_style;
pub mod properties;

// Re-exports for convenience
pub use cache::{CacheCounters, CacheStats, StyleCache};
pub use cell_style::{
    BorderKind, Borders, CellStyle, HorizontalAlign, ResolvedStyle, VerticalAlign, WidthHint,
    resolve_style,
};
pub use properties::{Property, StyleProperties, is_display_none};
