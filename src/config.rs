//! Configuration types for HTML to spreadsheet conversion.

use crate::common::{Error, Result, normalize_color};
use serde::{Deserialize, Serialize};

/// Configuration for HTML to spreadsheet conversion.
///
/// Every option has a default, so callers (and JSON documents) only name
/// what they want to change.
///
/// # Examples
///
/// ```rust
/// use htmlgrid::ConvertOptions;
///
/// // Create with defaults
/// let options = ConvertOptions::default();
/// assert_eq!(options.chunk_size, 2_000);
///
/// // Or customize
/// let options = ConvertOptions::new()
///     .with_max_nested_depth(1)
///     .with_column_width_bounds(6.0, 60.0)
///     .with_default_font("Arial", 10.0);
///
/// // Or load from JSON
/// let options = ConvertOptions::from_json(r#"{"chunk_size": 500}"#).unwrap();
/// assert_eq!(options.chunk_size, 500);
/// assert_eq!(options.max_nested_depth, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Grid rows buffered by the emitter before they are flushed to the sink
    pub chunk_size: usize,
    /// Deepest nesting level rendered; top-level tables are level 0
    pub max_nested_depth: usize,
    /// Lower bound of a column width, in character units
    pub min_column_width: f64,
    /// Upper bound of a column width, in character units
    pub max_column_width: f64,
    /// Cell text is truncated to this many characters
    pub max_cell_length: usize,
    /// Keep `<br>` and block boundaries as line breaks inside a cell
    pub preserve_line_breaks: bool,
    /// Font used when a cell names none
    pub default_font_name: String,
    /// Font size in points used when a cell names none
    pub default_font_size: f64,
    /// Blank rows between consecutive tables of one document
    pub table_spacing: u32,
    /// Blank rows between the last table of a document and the next document
    pub document_spacing: u32,
    /// Render `<th>` cells bold unless their style says otherwise
    pub header_bold: bool,
    /// Fill color for `<th>` cells without an explicit background
    pub header_background: Option<String>,
    /// Compute column widths from cell content
    pub auto_width: bool,
    /// Line height as a multiple of the font size, used for row heights
    pub row_height_multiplier: f64,
    /// Height in points below which rows keep the sink default
    pub default_row_height: f64,
    /// Capacity of the parsed-style cache
    pub style_cache_capacity: usize,
    /// Capacity of the normalized-color cache
    pub color_cache_capacity: usize,
    /// Capacity of the output-format cache
    pub format_cache_capacity: usize,
    /// Worker threads used to build grids of large inputs
    pub worker_threads: usize,
    /// Inputs at least this large (in bytes) build grids in parallel
    pub parallel_threshold_bytes: usize,
    /// Fail with [`Error::NoTablesFound`] when nothing was rendered
    pub require_tables: bool,
    /// Name of the worksheet receiving the tables
    pub sheet_name: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            chunk_size: 2_000,
            max_nested_depth: 3,
            min_column_width: 8.0,
            max_column_width: 100.0,
            max_cell_length: 32_767,
            preserve_line_breaks: true,
            default_font_name: "Calibri".to_string(),
            default_font_size: 11.0,
            table_spacing: 2,
            document_spacing: 2,
            header_bold: true,
            header_background: None,
            auto_width: true,
            row_height_multiplier: 1.2,
            default_row_height: 15.0,
            style_cache_capacity: 2_500,
            color_cache_capacity: 2_500,
            format_cache_capacity: 2_500,
            worker_threads: 4,
            parallel_threshold_bytes: 1_000_000,
            require_tables: false,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl ConvertOptions {
    /// Create a new `ConvertOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object and validate them.
    ///
    /// Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that the options describe a usable conversion.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be at least 1".to_string()));
        }
        if !(self.min_column_width > 0.0 && self.min_column_width.is_finite()) {
            return Err(Error::InvalidConfig(
                "min_column_width must be positive".to_string(),
            ));
        }
        if !(self.max_column_width >= self.min_column_width && self.max_column_width.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "max_column_width {} is below min_column_width {}",
                self.max_column_width, self.min_column_width
            )));
        }
        if self.max_cell_length == 0 {
            return Err(Error::InvalidConfig(
                "max_cell_length must be at least 1".to_string(),
            ));
        }
        if !(self.default_font_size > 0.0 && self.default_font_size.is_finite()) {
            return Err(Error::InvalidConfig(
                "default_font_size must be positive".to_string(),
            ));
        }
        if !(self.row_height_multiplier > 0.0 && self.row_height_multiplier.is_finite()) {
            return Err(Error::InvalidConfig(
                "row_height_multiplier must be positive".to_string(),
            ));
        }
        if self.default_font_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "default_font_name must not be empty".to_string(),
            ));
        }
        if self.sheet_name.trim().is_empty() || self.sheet_name.chars().count() > 31 {
            return Err(Error::InvalidConfig(format!(
                "sheet_name {:?} must have 1 to 31 characters",
                self.sheet_name
            )));
        }
        if let Some(ref color) = self.header_background
            && normalize_color(color).is_none()
        {
            return Err(Error::InvalidConfig(format!(
                "header_background {:?} is not a color",
                color
            )));
        }
        Ok(())
    }

    /// Set the number of rows buffered before each sink flush.
    #[inline]
    pub fn with_chunk_size(mut self, rows: usize) -> Self {
        self.chunk_size = rows;
        self
    }

    /// Set the deepest nested table level that is still rendered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use htmlgrid::ConvertOptions;
    ///
    /// // Only top-level tables and their direct children.
    /// let options = ConvertOptions::new().with_max_nested_depth(1);
    /// ```
    #[inline]
    pub fn with_max_nested_depth(mut self, depth: usize) -> Self {
        self.max_nested_depth = depth;
        self
    }

    /// Set the column width clamp, in character units.
    #[inline]
    pub fn with_column_width_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_column_width = min;
        self.max_column_width = max;
        self
    }

    /// Set the maximum number of characters kept per cell.
    #[inline]
    pub fn with_max_cell_length(mut self, chars: usize) -> Self {
        self.max_cell_length = chars;
        self
    }

    /// Keep or flatten line breaks inside cells.
    #[inline]
    pub fn with_line_breaks(mut self, preserve: bool) -> Self {
        self.preserve_line_breaks = preserve;
        self
    }

    /// Set the fallback font.
    #[inline]
    pub fn with_default_font(mut self, name: impl Into<String>, size: f64) -> Self {
        self.default_font_name = name.into();
        self.default_font_size = size;
        self
    }

    /// Set the blank rows inserted between tables and between documents.
    #[inline]
    pub fn with_spacing(mut self, between_tables: u32, between_documents: u32) -> Self {
        self.table_spacing = between_tables;
        self.document_spacing = between_documents;
        self
    }

    /// Configure the default look of `<th>` cells.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use htmlgrid::ConvertOptions;
    ///
    /// let options = ConvertOptions::new().with_header_style(true, Some("#A6A6A6"));
    /// assert!(options.validate().is_ok());
    /// ```
    #[inline]
    pub fn with_header_style(mut self, bold: bool, background: Option<&str>) -> Self {
        self.header_bold = bold;
        self.header_background = background.map(str::to_string);
        self
    }

    /// Enable or disable content-based column widths.
    #[inline]
    pub fn with_auto_width(mut self, enabled: bool) -> Self {
        self.auto_width = enabled;
        self
    }

    /// Set the capacity shared by all three style caches.
    #[inline]
    pub fn with_cache_capacity(mut self, entries: usize) -> Self {
        self.style_cache_capacity = entries;
        self.color_cache_capacity = entries;
        self.format_cache_capacity = entries;
        self
    }

    /// Set the worker pool size and the input size that turns it on.
    #[inline]
    pub fn with_parallelism(mut self, threads: usize, threshold_bytes: usize) -> Self {
        self.worker_threads = threads;
        self.parallel_threshold_bytes = threshold_bytes;
        self
    }

    /// Treat input without any table as a failed conversion.
    #[inline]
    pub fn with_require_tables(mut self, require: bool) -> Self {
        self.require_tables = require;
        self
    }

    /// Set the worksheet name.
    #[inline]
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }
}
