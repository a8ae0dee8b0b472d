//! Output sink abstraction.

use std::collections::HashMap;
use std::fmt;

use smallvec::SmallVec;

use crate::common::Result;
use crate::style::CellStyle;

/// Rows in an XLSX worksheet.
pub const SHEET_MAX_ROWS: u32 = 1_048_576;
/// Columns in an XLSX worksheet (`A` through `XFD`).
pub const SHEET_MAX_COLS: u32 = 16_384;

/// Opaque reference to a cell format created by a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatHandle(pub u32);

/// Inclusive rectangle of merged cells, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl MergeRange {
    pub fn new(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    pub fn overlaps(&self, other: &MergeRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }
}

/// Spreadsheet letters of a 0-based column index (`0` is `A`).
pub fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut col = col + 1;
    while col > 0 {
        col -= 1;
        letters.push(b'A' + (col % 26) as u8);
        col /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1-style reference of a 0-based position.
pub fn cell_reference(row: u32, col: u32) -> String {
    let mut reference = column_letters(col);
    reference.push_str(itoa::Buffer::new().format(row + 1));
    reference
}

impl fmt::Display for MergeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_reference(self.first_row, self.first_col),
            cell_reference(self.last_row, self.last_col)
        )
    }
}

/// Destination of laid-out cells.
///
/// Positions are 0-based. The emitter calls [`new_sheet`](Self::new_sheet)
/// once, then writes cells in row-major order, calling
/// [`flush`](Self::flush) after every chunk of rows. Column widths are set
/// once after the last table; [`close`](Self::close) comes last.
///
/// A sink with a bounded sheet returns
/// [`Error::OutOfRange`](crate::Error::OutOfRange) for positions past its
/// last row or column and writes nothing for them.
pub trait SheetSink {
    fn new_sheet(&mut self, name: &str) -> Result<()>;

    /// Register `style` and return its handle.
    fn create_format(&mut self, style: &CellStyle) -> Result<FormatHandle>;

    fn write_cell(&mut self, row: u32, col: u32, text: &str, format: FormatHandle) -> Result<()>;

    /// Merge `range` and write `text` into its top-left cell. A sink that
    /// renders cells gives the other positions `format` with no content.
    ///
    /// Fails with [`Error::MergeConflict`](crate::Error::MergeConflict) when
    /// the range overlaps one merged earlier; nothing is written then.
    fn merge_cells(&mut self, range: MergeRange, text: &str, format: FormatHandle) -> Result<()>;

    /// Width in character units.
    fn set_column_width(&mut self, col: u32, width: f64) -> Result<()>;

    /// Height in points.
    fn set_row_height(&mut self, row: u32, height: f64) -> Result<()>;

    /// Rows written so far will not be touched again.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()>;
}

/// Merge ranges accepted so far, indexed by row for overlap checks.
#[derive(Debug, Default)]
pub struct MergeIndex {
    by_row: HashMap<u32, SmallVec<[(u32, u32); 4]>>,
    ranges: Vec<MergeRange>,
}

impl MergeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `range` overlaps an accepted range.
    pub fn conflicts(&self, range: &MergeRange) -> bool {
        (range.first_row..=range.last_row).any(|row| {
            self.by_row.get(&row).is_some_and(|spans| {
                spans
                    .iter()
                    .any(|&(first, last)| first <= range.last_col && range.first_col <= last)
            })
        })
    }

    /// Accept `range` unless it overlaps an accepted one.
    pub fn insert(&mut self, range: MergeRange) -> bool {
        if self.conflicts(&range) {
            return false;
        }
        for row in range.first_row..=range.last_row {
            self.by_row
                .entry(row)
                .or_default()
                .push((range.first_col, range.last_col));
        }
        self.ranges.push(range);
        true
    }

    pub fn ranges(&self) -> &[MergeRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_merge_range_display() {
        assert_eq!(MergeRange::new(0, 0, 1, 1).to_string(), "A1:B2");
        assert_eq!(MergeRange::new(9, 26, 9, 27).to_string(), "AA10:AB10");
    }

    #[test]
    fn test_merge_index_overlap() {
        let mut index = MergeIndex::new();
        assert!(index.insert(MergeRange::new(0, 0, 1, 1)));
        assert!(index.insert(MergeRange::new(0, 2, 0, 3)));
        assert!(!index.insert(MergeRange::new(1, 1, 2, 2)));
        assert!(index.insert(MergeRange::new(2, 0, 2, 1)));
        assert_eq!(index.len(), 3);
        assert!(MergeRange::new(0, 0, 1, 1).overlaps(&MergeRange::new(1, 1, 1, 1)));
        assert!(!MergeRange::new(0, 0, 1, 1).overlaps(&MergeRange::new(2, 0, 2, 0)));
    }
}
