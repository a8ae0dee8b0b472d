//! Grid to sink.
//!
//! The emitter walks a resolved grid row by row. Writes for at most
//! `chunk_size` rows are buffered before they reach the sink, and the sink
//! is flushed after every chunk, so memory stays bounded by the chunk size
//! whatever the table size.

use tracing::{debug, trace};

use super::sink::{FormatHandle, MergeRange, SheetSink};
use super::width::{ColumnWidthAccumulator, estimate_cell_width};
use crate::common::{Error, Result};
use crate::config::ConvertOptions;
use crate::style::StyleCache;
use crate::table::{CellOrigin, Grid};

/// What one [`GridEmitter::emit`] call wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub rows: usize,
    pub cells: usize,
    pub merges: usize,
    pub merges_rejected: usize,
    /// Origins the sink refused as past its last row or column
    pub out_of_range: usize,
}

/// A buffered write.
struct PendingWrite<'g> {
    row: u32,
    col: u32,
    origin: &'g CellOrigin,
    format: FormatHandle,
}

/// Writes grids to a sink and tracks column widths across all of them.
pub struct GridEmitter<'a> {
    options: &'a ConvertOptions,
    widths: ColumnWidthAccumulator,
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Sink(format!("{what} {value} out of range")))
}

impl<'a> GridEmitter<'a> {
    pub fn new(options: &'a ConvertOptions) -> Self {
        Self {
            options,
            widths: ColumnWidthAccumulator::from_options(options),
        }
    }

    /// Write `grid` with its top-left at `(origin_row, origin_col)`.
    pub fn emit<S: SheetSink + ?Sized>(
        &mut self,
        grid: &Grid,
        origin_row: u32,
        origin_col: u32,
        sink: &mut S,
        cache: &StyleCache,
    ) -> Result<EmitSummary> {
        let mut summary = EmitSummary {
            rows: grid.rows(),
            ..Default::default()
        };
        let chunk_size = self.options.chunk_size.max(1);
        let mut pending: Vec<PendingWrite<'_>> = Vec::new();

        for (chunk, start) in (0..grid.rows()).step_by(chunk_size).enumerate() {
            let end = (start + chunk_size).min(grid.rows());

            for r in start..end {
                let row = origin_row + to_u32(r, "row")?;
                let mut height: f64 = 0.0;

                for c in 0..grid.cols() {
                    let Some(origin) = grid.origin_at(r, c) else {
                        continue;
                    };
                    let col = origin_col + to_u32(c, "column")?;
                    let format = cache.format_handle(&origin.style, |style| sink.create_format(style))?;
                    pending.push(PendingWrite {
                        row,
                        col,
                        origin,
                        format,
                    });

                    if self.options.auto_width {
                        let width = estimate_cell_width(
                            &origin.text,
                            &origin.style,
                            &origin.width_hint,
                            self.options,
                        );
                        self.widths
                            .observe_span(col, to_u32(origin.colspan, "colspan")?, width);
                    }
                    if origin.rowspan == 1 {
                        height = height.max(self.line_height(origin));
                    }
                }

                if height > self.options.default_row_height {
                    match sink.set_row_height(row, height) {
                        Ok(()) | Err(Error::OutOfRange { .. }) => {},
                        Err(err) => return Err(err),
                    }
                }
            }

            trace!(chunk, writes = pending.len(), "flushing chunk");
            self.drain(&mut pending, sink, &mut summary)?;
            sink.flush()?;
        }

        debug!(
            rows = summary.rows,
            cells = summary.cells,
            merges = summary.merges,
            rejected = summary.merges_rejected,
            out_of_range = summary.out_of_range,
            "grid emitted"
        );
        Ok(summary)
    }

    /// Points needed to show every line of `origin`'s text.
    fn line_height(&self, origin: &CellOrigin) -> f64 {
        let lines = origin.text.lines().count().max(1);
        lines as f64 * origin.style.font_size_pt() * self.options.row_height_multiplier
    }

    fn drain<S: SheetSink + ?Sized>(
        &self,
        pending: &mut Vec<PendingWrite<'_>>,
        sink: &mut S,
        summary: &mut EmitSummary,
    ) -> Result<()> {
        for write in pending.drain(..) {
            let origin = write.origin;

            if !origin.is_merged() {
                self.write_origin(&write, sink, summary)?;
                continue;
            }

            let range = MergeRange::new(
                write.row,
                write.col,
                write.row.saturating_add(to_u32(origin.rowspan - 1, "rowspan")?),
                write.col.saturating_add(to_u32(origin.colspan - 1, "colspan")?),
            );
            match sink.merge_cells(range, &origin.text, write.format) {
                Ok(()) => {
                    summary.cells += 1;
                    summary.merges += 1;
                },
                Err(Error::MergeConflict(range)) => {
                    debug!(%range, "merge rejected, writing origin cell alone");
                    summary.merges_rejected += 1;
                    self.write_origin(&write, sink, summary)?;
                },
                Err(Error::OutOfRange { row, col }) => {
                    debug!(%range, row, col, "merge past sheet limits, writing origin cell alone");
                    summary.merges_rejected += 1;
                    self.write_origin(&write, sink, summary)?;
                },
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Write the origin of `write` as a single cell. Origins past the
    /// sink's limits are skipped and counted.
    fn write_origin<S: SheetSink + ?Sized>(
        &self,
        write: &PendingWrite<'_>,
        sink: &mut S,
        summary: &mut EmitSummary,
    ) -> Result<()> {
        match sink.write_cell(write.row, write.col, &write.origin.text, write.format) {
            Ok(()) => summary.cells += 1,
            Err(Error::OutOfRange { row, col }) => {
                debug!(row, col, "cell past sheet limits skipped");
                summary.out_of_range += 1;
            },
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// Widths observed so far.
    pub fn widths(&self) -> &ColumnWidthAccumulator {
        &self.widths
    }

    /// Apply the accumulated column widths; call once after the last grid.
    pub fn finish<S: SheetSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        if self.options.auto_width {
            self.widths.apply(sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::MemorySink;
    use crate::html::TableExtractor;
    use crate::table::NestedTableResolver;
    use scraper::Html;

    fn grid(html: &str, options: &ConvertOptions, cache: &StyleCache) -> Grid {
        let document = Html::parse_document(html);
        let tables = TableExtractor::new(options).extract_tables(&document);
        NestedTableResolver::new(options, cache).resolve(&tables[0])
    }

    #[test]
    fn test_emit_cells_and_merges() {
        let options = ConvertOptions::default();
        let cache = StyleCache::new(&options);
        let grid = grid(
            "<table><tr><th colspan=2>Title</th></tr><tr><td>a</td><td>b</td></tr></table>",
            &options,
            &cache,
        );
        let mut sink = MemorySink::new();
        let mut emitter = GridEmitter::new(&options);
        let summary = emitter.emit(&grid, 3, 1, &mut sink, &cache).unwrap();

        assert_eq!(summary.cells, 3);
        assert_eq!(summary.merges, 1);
        assert_eq!(sink.merges.ranges(), &[MergeRange::new(3, 1, 3, 2)]);
        assert_eq!(sink.text(3, 1), Some("Title"));
        assert_eq!(sink.text(4, 2), Some("b"));
        assert!(sink.style(3, 1).unwrap().bold);
        assert_eq!(sink.flushes, 1);
    }

    #[test]
    fn test_rejected_merge_falls_back_to_single_cell() {
        let options = ConvertOptions::default();
        let cache = StyleCache::new(&options);
        let grid = grid("<table><tr><td rowspan=2>m</td><td>x</td></tr><tr><td>y</td></tr></table>", &options, &cache);

        let mut sink = MemorySink::new();
        sink.merge_cells(MergeRange::new(1, 0, 1, 0), "", FormatHandle(0))
            .unwrap();
        let mut emitter = GridEmitter::new(&options);
        let summary = emitter.emit(&grid, 0, 0, &mut sink, &cache).unwrap();

        assert_eq!(summary.merges, 0);
        assert_eq!(summary.merges_rejected, 1);
        assert_eq!(sink.text(0, 0), Some("m"));
        assert_eq!(sink.text(1, 1), Some("y"));
    }

    #[test]
    fn test_cells_past_sheet_limits_are_skipped() {
        let options = ConvertOptions::default();
        let cache = StyleCache::new(&options);
        let grid = grid(
            "<table><tr><td colspan=3>wide</td><td>edge</td></tr></table>",
            &options,
            &cache,
        );
        let mut sink = crate::ooxml::XlsxSink::in_memory(&options);
        sink.new_sheet("Sheet1").unwrap();
        let mut emitter = GridEmitter::new(&options);
        let first_col = crate::emit::SHEET_MAX_COLS - 2;
        let summary = emitter.emit(&grid, 0, first_col, &mut sink, &cache).unwrap();

        // The merge runs past XFD and falls back to its origin; `edge` has
        // no column left.
        assert_eq!(summary.merges, 0);
        assert_eq!(summary.merges_rejected, 1);
        assert_eq!(summary.cells, 1);
        assert_eq!(summary.out_of_range, 1);
        emitter.finish(&mut sink).unwrap();
        sink.close().unwrap();
    }

    #[test]
    fn test_chunked_flushes() {
        let options = ConvertOptions::default().with_chunk_size(2);
        let cache = StyleCache::new(&options);
        let rows: String = (0..5).map(|i| format!("<tr><td>{i}</td></tr>")).collect();
        let grid = grid(&format!("<table>{rows}</table>"), &options, &cache);

        let mut sink = MemorySink::new();
        let mut emitter = GridEmitter::new(&options);
        emitter.emit(&grid, 0, 0, &mut sink, &cache).unwrap();

        assert_eq!(sink.flushes, 3);
        assert_eq!(sink.text(4, 0), Some("4"));
    }

    #[test]
    fn test_formats_created_once_per_style() {
        let options = ConvertOptions::default();
        let cache = StyleCache::new(&options);
        let grid = grid(
            "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td style='color:red'>d</td></tr></table>",
            &options,
            &cache,
        );
        let mut sink = MemorySink::new();
        GridEmitter::new(&options)
            .emit(&grid, 0, 0, &mut sink, &cache)
            .unwrap();
        assert_eq!(sink.format_requests, 2);
        assert_eq!(sink.formats.len(), 2);
    }

    #[test]
    fn test_widths_applied_on_finish() {
        let options = ConvertOptions::default();
        let cache = StyleCache::new(&options);
        let long = "x".repeat(30);
        let grid = grid(
            &format!("<table><tr><td>{long}</td><td>b</td></tr><tr><td colspan=2>{long}{long}</td></tr></table>"),
            &options,
            &cache,
        );
        let mut sink = MemorySink::new();
        let mut emitter = GridEmitter::new(&options);
        emitter.emit(&grid, 0, 0, &mut sink, &cache).unwrap();
        assert!(sink.column_widths.is_empty());

        emitter.finish(&mut sink).unwrap();
        assert_eq!(sink.column_widths.get(&0), Some(&30.0));
        assert_eq!(sink.column_widths.get(&1), Some(&30.0));
    }

    #[test]
    fn test_short_spanning_cell_keeps_minimum_widths() {
        let options = ConvertOptions::default();
        let cache = StyleCache::new(&options);
        let grid = grid("<table><tr><td colspan=3>a</td></tr></table>", &options, &cache);
        let mut sink = MemorySink::new();
        let mut emitter = GridEmitter::new(&options);
        emitter.emit(&grid, 0, 0, &mut sink, &cache).unwrap();
        emitter.finish(&mut sink).unwrap();

        assert_eq!(sink.column_widths.len(), 3);
        assert!(sink.column_widths.values().all(|&width| width == 8.0));
    }

    #[test]
    fn test_tall_rows_get_height() {
        let options = ConvertOptions::default();
        let cache = StyleCache::new(&options);
        let grid = grid("<table><tr><td>one<br>two<br>three</td></tr><tr><td>x</td></tr></table>", &options, &cache);
        let mut sink = MemorySink::new();
        GridEmitter::new(&options)
            .emit(&grid, 0, 0, &mut sink, &cache)
            .unwrap();
        let height = sink.row_heights.get(&0).copied().unwrap();
        assert!((height - 3.0 * 11.0 * 1.2).abs() < 1e-9);
        assert!(!sink.row_heights.contains_key(&1));
    }
}
