//! Streaming worksheet writer.
//!
//! Rows are buffered until the sink is flushed, then serialized into a
//! spooled temporary file that stays in memory up to a threshold and moves
//! to disk beyond it. The `<cols>` element precedes `<sheetData>` but column
//! widths are only known at the end, so the worksheet part is assembled when
//! it is finished: header, spooled rows, footer.
//!
//! Merges fill their covered positions with styled blanks, which can reach
//! rows below the ones the emitter has written so far. Flushing stops at the
//! last row written directly, so those rows stay open until the emitter
//! reaches them.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io::{self, Seek, SeekFrom, Write};

use tempfile::SpooledTempFile;

use crate::common::{Error, Result};
use crate::emit::{MergeIndex, MergeRange, SHEET_MAX_COLS, SHEET_MAX_ROWS, cell_reference};

/// Serialized rows kept in memory before spilling to disk.
const SPOOL_THRESHOLD: usize = 8 * 1024 * 1024;

/// One cell of a pending row.
#[derive(Debug, Clone, Copy)]
struct SheetCell {
    /// Shared string index, `None` for a styled empty cell
    string: Option<usize>,
    style: usize,
}

#[derive(Debug, Default)]
struct PendingRow {
    height: Option<f64>,
    cells: BTreeMap<u32, SheetCell>,
}

/// Used range as (min_row, min_col, max_row, max_col).
type UsedRange = (u32, u32, u32, u32);

/// Worksheet whose rows are written once, in order.
pub struct StreamingWorksheet {
    name: String,
    rows: BTreeMap<u32, PendingRow>,
    /// Highest row already serialized
    flushed_through: Option<u32>,
    /// Highest row written directly
    frontier: Option<u32>,
    spool: SpooledTempFile,
    column_widths: BTreeMap<u32, f64>,
    merges: MergeIndex,
    used_range: Option<UsedRange>,
    row_count: usize,
}

impl std::fmt::Debug for StreamingWorksheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingWorksheet")
            .field("name", &self.name)
            .field("pending_rows", &self.rows.len())
            .field("flushed_through", &self.flushed_through)
            .field("merges", &self.merges.len())
            .finish()
    }
}

impl StreamingWorksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            flushed_through: None,
            frontier: None,
            spool: SpooledTempFile::new(SPOOL_THRESHOLD),
            column_widths: BTreeMap::new(),
            merges: MergeIndex::new(),
            used_range: None,
            row_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn pending_row(&mut self, row: u32) -> Result<&mut PendingRow> {
        if self.flushed_through.is_some_and(|flushed| row <= flushed) {
            return Err(Error::Sink(format!(
                "row {} of sheet {:?} was already flushed",
                row + 1,
                self.name
            )));
        }
        Ok(self.rows.entry(row).or_default())
    }

    fn check_position(row: u32, col: u32) -> Result<()> {
        if row >= SHEET_MAX_ROWS || col >= SHEET_MAX_COLS {
            return Err(Error::OutOfRange { row, col });
        }
        Ok(())
    }

    fn advance_frontier(&mut self, row: u32) {
        self.frontier = Some(self.frontier.map_or(row, |frontier| frontier.max(row)));
    }

    fn extend_used_range(&mut self, first_row: u32, first_col: u32, last_row: u32, last_col: u32) {
        self.used_range = Some(match self.used_range {
            None => (first_row, first_col, last_row, last_col),
            Some((min_row, min_col, max_row, max_col)) => (
                min_row.min(first_row),
                min_col.min(first_col),
                max_row.max(last_row),
                max_col.max(last_col),
            ),
        });
    }

    /// Place a cell; `string` is a shared string index.
    pub fn write_cell(
        &mut self,
        row: u32,
        col: u32,
        string: Option<usize>,
        style: usize,
    ) -> Result<()> {
        Self::check_position(row, col)?;
        self.pending_row(row)?
            .cells
            .insert(col, SheetCell { string, style });
        self.advance_frontier(row);
        self.extend_used_range(row, col, row, col);
        Ok(())
    }

    /// Give every position of `range` but its top-left a styled blank,
    /// leaving cells already present untouched.
    pub fn fill_blanks(&mut self, range: &MergeRange, style: usize) -> Result<()> {
        Self::check_position(range.last_row, range.last_col)?;
        for row in range.first_row..=range.last_row {
            let pending = self.pending_row(row)?;
            for col in range.first_col..=range.last_col {
                if (row, col) == (range.first_row, range.first_col) {
                    continue;
                }
                pending.cells.entry(col).or_insert(SheetCell {
                    string: None,
                    style,
                });
            }
        }
        Ok(())
    }

    /// Record a merge range unless it overlaps an earlier one.
    pub fn merge(&mut self, range: MergeRange) -> Result<()> {
        Self::check_position(range.last_row, range.last_col)?;
        if !self.merges.insert(range) {
            return Err(Error::MergeConflict(range));
        }
        self.extend_used_range(range.first_row, range.first_col, range.last_row, range.last_col);
        Ok(())
    }

    /// Whether `range` would be rejected by [`merge`](Self::merge).
    pub fn merge_conflicts(&self, range: &MergeRange) -> bool {
        self.merges.conflicts(range)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        Self::check_position(row, 0)?;
        self.pending_row(row)?.height = Some(height);
        self.advance_frontier(row);
        Ok(())
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) -> Result<()> {
        Self::check_position(0, col)?;
        self.column_widths.insert(col, width);
        Ok(())
    }

    /// Rows serialized so far.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Serialize pending rows up to the last row written directly.
    pub fn flush(&mut self) -> Result<()> {
        match self.frontier {
            Some(frontier) => self.flush_through(frontier),
            None => Ok(()),
        }
    }

    fn flush_through(&mut self, last: u32) -> Result<()> {
        let rest = match last.checked_add(1) {
            Some(next) => self.rows.split_off(&next),
            None => BTreeMap::new(),
        };
        let rows = std::mem::replace(&mut self.rows, rest);
        if rows.is_empty() {
            return Ok(());
        }

        let mut xml = String::with_capacity(rows.len() * 128);
        for (row, pending) in &rows {
            Self::write_row(&mut xml, *row, pending)?;
        }
        self.spool.write_all(xml.as_bytes())?;

        self.row_count += rows.len();
        self.flushed_through = rows.keys().next_back().copied().max(self.flushed_through);
        Ok(())
    }

    fn write_row(xml: &mut String, row: u32, pending: &PendingRow) -> Result<()> {
        // NOTE: Excel uses 1-based row numbering
        write!(xml, r#"<row r="{}""#, row + 1)?;
        if let Some(height) = pending.height {
            write!(
                xml,
                r#" ht="{}" customHeight="1""#,
                ryu::Buffer::new().format(round_hundredths(height))
            )?;
        }

        if pending.cells.is_empty() {
            xml.push_str("/>");
            return Ok(());
        }
        xml.push('>');

        for (&col, cell) in &pending.cells {
            write!(xml, r#"<c r="{}""#, cell_reference(row, col))?;
            if cell.style != 0 {
                write!(xml, r#" s="{}""#, cell.style)?;
            }
            match cell.string {
                Some(index) => write!(xml, r#" t="s"><v>{}</v></c>"#, index)?,
                None => xml.push_str("/>"),
            }
        }

        xml.push_str("</row>");
        Ok(())
    }

    fn write_header(&self, xml: &mut String) -> Result<()> {
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);

        match self.used_range {
            Some((min_row, min_col, max_row, max_col)) if (min_row, min_col) != (max_row, max_col) => {
                write!(
                    xml,
                    r#"<dimension ref="{}:{}"/>"#,
                    cell_reference(min_row, min_col),
                    cell_reference(max_row, max_col)
                )?;
            },
            Some((row, col, _, _)) => {
                write!(xml, r#"<dimension ref="{}"/>"#, cell_reference(row, col))?;
            },
            None => xml.push_str(r#"<dimension ref="A1"/>"#),
        }

        xml.push_str(r#"<sheetViews><sheetView tabSelected="1" workbookViewId="0"/></sheetViews>"#);
        xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);

        if !self.column_widths.is_empty() {
            xml.push_str("<cols>");
            for (&col, &width) in &self.column_widths {
                // NOTE: Excel uses 1-based column numbering for min/max attributes
                write!(
                    xml,
                    r#"<col min="{}" max="{}" width="{}" customWidth="1"/>"#,
                    col + 1,
                    col + 1,
                    ryu::Buffer::new().format(round_hundredths(width))
                )?;
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        Ok(())
    }

    fn write_footer(&self, xml: &mut String) -> Result<()> {
        xml.push_str("</sheetData>");

        if !self.merges.is_empty() {
            write!(xml, r#"<mergeCells count="{}">"#, self.merges.len())?;
            for range in self.merges.ranges() {
                write!(xml, r#"<mergeCell ref="{}"/>"#, range)?;
            }
            xml.push_str("</mergeCells>");
        }

        xml.push_str(r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#);
        xml.push_str("</worksheet>");
        Ok(())
    }

    /// Flush what is pending and write the complete worksheet part to `out`.
    pub fn finish<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if let Some(&last) = self.rows.keys().next_back() {
            self.flush_through(last)?;
        }

        let mut header = String::with_capacity(1024 + self.column_widths.len() * 64);
        self.write_header(&mut header)?;
        out.write_all(header.as_bytes())?;

        self.spool.seek(SeekFrom::Start(0))?;
        io::copy(&mut self.spool, out)?;

        let mut footer = String::with_capacity(256 + self.merges.len() * 32);
        self.write_footer(&mut footer)?;
        out.write_all(footer.as_bytes())?;
        Ok(())
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
