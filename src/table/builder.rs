//! Row/cell structure to dense matrix.
//!
//! Cells are placed the way browsers lay out tables: each cell takes the
//! first column of its row not already covered by an earlier rowspan or
//! colspan. Malformed markup never fails the build. Spans that would overlap
//! earlier cells are shrunk, and cells that find no free column in their row
//! are dropped and counted. Tables are at most as wide as a sheet.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::grid::{CellOrigin, CellRef, Grid};
use crate::config::ConvertOptions;
use crate::emit::SHEET_MAX_COLS;
use crate::html::{CellKind, CellNode, StyleAttributes, TableNode};
use crate::report::Degradation;
use crate::style::{CellStyle, StyleCache, StyleProperties, WidthHint, resolve_style};

/// Lays out one table, without looking into nested tables.
pub struct TableMatrixBuilder<'a> {
    options: &'a ConvertOptions,
    cache: &'a StyleCache,
}

/// Style resolved for one combination of cell and row attributes.
struct StyleEntry {
    style: Arc<CellStyle>,
    width_hint: WidthHint,
    degraded: bool,
}

impl<'a> TableMatrixBuilder<'a> {
    pub fn new(options: &'a ConvertOptions, cache: &'a StyleCache) -> Self {
        Self { options, cache }
    }

    /// Resolve `table` into a grid of origins.
    pub fn build(&self, table: &TableNode) -> Grid {
        let rows: Vec<_> = table.visible_rows().collect();
        let cols = rows
            .iter()
            .map(|(_, row)| {
                row.cells
                    .iter()
                    .map(|cell| cell.colspan.max(1) as usize)
                    .sum::<usize>()
            })
            .max()
            .unwrap_or(0)
            .min(SHEET_MAX_COLS as usize);

        if rows.is_empty() || cols == 0 {
            return Grid::empty();
        }

        let mut grid = Grid::new(rows.len(), cols);
        let mut styles: HashMap<(&StyleAttributes, &StyleAttributes, CellKind), StyleEntry> =
            HashMap::new();

        for (r, &(row_index, row)) in rows.iter().enumerate() {
            let row_props = self.properties(&row.attributes);
            let mut cursor = 0;

            for (cell_index, cell) in row.cells.iter().enumerate() {
                while cursor < cols && !grid.is_free(r, cursor) {
                    cursor += 1;
                }
                if cursor >= cols {
                    debug!(row = r, cell = cell_index, "no free column, cell dropped");
                    grid.record(Degradation::CellDropped);
                    continue;
                }
                let col = cursor;

                let (rowspan, colspan, conflicts) = fit_span(&grid, r, col, cell);
                for _ in 0..conflicts {
                    grid.record(Degradation::SpanConflict);
                }

                let entry = styles
                    .entry((&cell.attributes, &row.attributes, cell.kind))
                    .or_insert_with(|| self.resolve(cell, &row_props));
                if entry.degraded {
                    grid.record(Degradation::StyleParse);
                }

                let origin = CellOrigin {
                    text: truncate_chars(cell.text(), self.options.max_cell_length),
                    style: Arc::clone(&entry.style),
                    width_hint: entry.width_hint,
                    row: r,
                    col,
                    rowspan,
                    colspan,
                    header: cell.kind == CellKind::Header,
                    source: Some(CellRef {
                        row: row_index,
                        cell: cell_index,
                    }),
                };
                // `fit_span` only returns free rectangles.
                if grid.claim(origin).is_none() {
                    trace!(row = r, col, "cell rectangle rejected");
                    continue;
                }
                cursor = col + colspan;
            }
        }

        grid
    }

    fn properties(&self, attributes: &StyleAttributes) -> StyleProperties {
        let mut props = StyleProperties::from_attributes(attributes);
        if let Some(ref style) = attributes.style {
            props.overlay(&self.cache.properties(style));
        }
        props
    }

    fn resolve(&self, cell: &CellNode, row_props: &StyleProperties) -> StyleEntry {
        let mut props = self.properties(&cell.attributes);
        props.inherit_from_row(row_props);
        let resolved = resolve_style(&props, cell.kind, self.options, |raw| self.cache.color(raw));
        StyleEntry {
            style: Arc::new(resolved.style),
            width_hint: resolved.width_hint,
            degraded: resolved.degraded,
        }
    }
}

/// Clamp the declared spans of `cell` placed at `(row, col)` to the grid and
/// shrink them away from covered positions.
///
/// The candidate rectangle is scanned row by row, left to right. A covered
/// position in the first row cuts the colspan at that column; one in a
/// later row cuts the rowspan at that row and ends the scan. Returns the
/// fitted spans and the number of cuts.
fn fit_span(grid: &Grid, row: usize, col: usize, cell: &CellNode) -> (usize, usize, usize) {
    let mut rowspan = (cell.rowspan.max(1) as usize).min(grid.rows() - row);
    let mut colspan = (cell.colspan.max(1) as usize).min(grid.cols() - col);
    let mut conflicts = 0;

    'scan: for r in row..row + rowspan {
        for c in col..col + colspan {
            if grid.is_free(r, c) {
                continue;
            }
            conflicts += 1;
            if r == row {
                colspan = c - col;
                break;
            }
            rowspan = r - row;
            break 'scan;
        }
    }

    (rowspan.max(1), colspan.max(1), conflicts)
}

/// Cut `text` to at most `max` characters.
pub(super) fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((index, _)) = text.char_indices().nth(max) {
        text.truncate(index);
    }
    text
}
