//! Sink that keeps everything in memory.

use std::collections::{BTreeMap, HashMap};

use super::sink::{FormatHandle, MergeIndex, MergeRange, SheetSink};
use crate::common::{Error, Result};
use crate::style::CellStyle;

/// A written cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCell {
    pub text: String,
    pub format: FormatHandle,
}

/// Records every sink call.
///
/// Useful to inspect a layout without producing a file. Formats are
/// deduplicated the way a workbook's style table is, so a handle re-created
/// after a cache eviction comes back unchanged.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub sheet: Option<String>,
    pub cells: BTreeMap<(u32, u32), MemoryCell>,
    pub merges: MergeIndex,
    pub formats: Vec<CellStyle>,
    format_index: HashMap<CellStyle, u32>,
    pub column_widths: BTreeMap<u32, f64>,
    pub row_heights: BTreeMap<u32, f64>,
    /// Calls to `create_format`, duplicates included
    pub format_requests: usize,
    pub flushes: usize,
    pub closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, row: u32, col: u32) -> Option<&str> {
        self.cells.get(&(row, col)).map(|cell| cell.text.as_str())
    }

    /// Style of the cell at `(row, col)`.
    pub fn style(&self, row: u32, col: u32) -> Option<&CellStyle> {
        let cell = self.cells.get(&(row, col))?;
        self.formats.get(cell.format.0 as usize)
    }

    /// Highest written row, if any.
    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().map(|&(row, _)| row).max()
    }
}

impl SheetSink for MemorySink {
    fn new_sheet(&mut self, name: &str) -> Result<()> {
        self.sheet = Some(name.to_string());
        Ok(())
    }

    fn create_format(&mut self, style: &CellStyle) -> Result<FormatHandle> {
        self.format_requests += 1;
        if let Some(&index) = self.format_index.get(style) {
            return Ok(FormatHandle(index));
        }
        let index = u32::try_from(self.formats.len())
            .map_err(|_| Error::Sink("too many formats".to_string()))?;
        self.formats.push(style.clone());
        self.format_index.insert(style.clone(), index);
        Ok(FormatHandle(index))
    }

    fn write_cell(&mut self, row: u32, col: u32, text: &str, format: FormatHandle) -> Result<()> {
        if self.closed {
            return Err(Error::Sink("sink already closed".to_string()));
        }
        self.cells.insert(
            (row, col),
            MemoryCell {
                text: text.to_string(),
                format,
            },
        );
        Ok(())
    }

    fn merge_cells(&mut self, range: MergeRange, text: &str, format: FormatHandle) -> Result<()> {
        if !self.merges.insert(range) {
            return Err(Error::MergeConflict(range));
        }
        self.write_cell(range.first_row, range.first_col, text, format)
    }

    fn set_column_width(&mut self, col: u32, width: f64) -> Result<()> {
        self.column_widths.insert(col, width);
        Ok(())
    }

    fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        self.row_heights.insert(row, height);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;

    #[test]
    fn test_formats_deduplicated() {
        let mut sink = MemorySink::new();
        let plain = CellStyle::plain(&ConvertOptions::default());
        let bold = CellStyle {
            bold: true,
            ..plain.clone()
        };
        assert_eq!(sink.create_format(&plain).unwrap(), FormatHandle(0));
        assert_eq!(sink.create_format(&bold).unwrap(), FormatHandle(1));
        assert_eq!(sink.create_format(&plain).unwrap(), FormatHandle(0));
        assert_eq!(sink.format_requests, 3);
    }

    #[test]
    fn test_merge_conflict_writes_nothing() {
        let mut sink = MemorySink::new();
        sink.merge_cells(MergeRange::new(0, 0, 1, 1), "a", FormatHandle(0))
            .unwrap();
        let err = sink
            .merge_cells(MergeRange::new(1, 1, 1, 2), "b", FormatHandle(0))
            .unwrap_err();
        assert!(matches!(err, Error::MergeConflict(range) if range.to_string() == "B2:C2"));
        assert_eq!(sink.text(1, 1), None);
        assert_eq!(sink.text(0, 0), Some("a"));
    }

    #[test]
    fn test_write_after_close_fails() {
        let mut sink = MemorySink::new();
        sink.close().unwrap();
        assert!(sink.write_cell(0, 0, "x", FormatHandle(0)).is_err());
    }
}
