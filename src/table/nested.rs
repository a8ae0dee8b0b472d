//! Nested table placement.
//!
//! A cell hosting tables is laid out as a vertical stack of blocks: each
//! text run takes one row and each nested table takes as many rows as its
//! own grid. The parent grid's rows and columns are stretched until every
//! host can hold its stack, then parent cells and nested grids are copied
//! into one composed grid at their absolute positions.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::builder::{TableMatrixBuilder, truncate_chars};
use super::grid::{CellOrigin, Grid, OriginId};
use crate::config::ConvertOptions;
use crate::html::{CellBlock, TableId, TableNode};
use crate::report::{Degradation, DegradationCounts};
use crate::style::StyleCache;

/// A nested table resolved into its own grid and anchored in the composed
/// grid of its parent.
#[derive(Debug, Clone)]
pub struct NestedTableRef {
    /// Hosting origin in the parent grid fresh from the builder
    pub host: OriginId,
    pub table: TableId,
    /// Nesting level of the nested table
    pub depth: usize,
    /// Absolute row of the nested grid's top-left in the composed grid
    pub row_offset: usize,
    /// Absolute column of the nested grid's top-left in the composed grid
    pub col_offset: usize,
    pub grid: Grid,
}

/// Blocks of one hosting cell, positioned once the parent is stretched.
struct HostStack {
    host: OriginId,
    /// Text runs with their row offsets
    texts: Vec<(usize, String)>,
    tables: Vec<NestedTableRef>,
    height: usize,
    width: usize,
}

/// Row and column starts of the stretched parent, as prefix sums.
struct Stretch {
    row_starts: Vec<usize>,
    col_starts: Vec<usize>,
}

impl Stretch {
    fn new(parent: &Grid, stacks: &[HostStack]) -> Self {
        let mut heights = vec![1usize; parent.rows()];
        let mut widths = vec![1usize; parent.cols()];

        // Hosts arrive in row-major order; a deficit goes to the last row or
        // column the host spans.
        for stack in stacks {
            let host = parent.origin(stack.host);
            let rows = host.row..host.row + host.rowspan;
            let have: usize = heights[rows.clone()].iter().sum();
            if have < stack.height {
                heights[rows.end - 1] += stack.height - have;
            }
            let cols = host.col..host.col + host.colspan;
            let have: usize = widths[cols.clone()].iter().sum();
            if have < stack.width {
                widths[cols.end - 1] += stack.width - have;
            }
        }

        Self {
            row_starts: prefix_sums(&heights),
            col_starts: prefix_sums(&widths),
        }
    }

    fn rows(&self) -> usize {
        self.row_starts.last().copied().unwrap_or(0)
    }

    fn cols(&self) -> usize {
        self.col_starts.last().copied().unwrap_or(0)
    }
}

fn prefix_sums(sizes: &[usize]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(sizes.len() + 1);
    let mut total = 0;
    starts.push(0);
    for size in sizes {
        total += size;
        starts.push(total);
    }
    starts
}

/// Resolves a table together with every table nested inside it.
pub struct NestedTableResolver<'a> {
    options: &'a ConvertOptions,
    builder: TableMatrixBuilder<'a>,
}

impl<'a> NestedTableResolver<'a> {
    pub fn new(options: &'a ConvertOptions, cache: &'a StyleCache) -> Self {
        Self {
            options,
            builder: TableMatrixBuilder::new(options, cache),
        }
    }

    /// Build the composed grid of `table` and its nested tables.
    pub fn resolve(&self, table: &TableNode) -> Grid {
        self.resolve_at(table, table.depth)
    }

    /// Build the composed grid of `table`, treating it as nesting level
    /// `depth`. Its children are level `depth + 1`.
    pub fn resolve_at(&self, table: &TableNode, depth: usize) -> Grid {
        let mut visited = HashSet::new();
        self.resolve_with(table, depth, &mut visited)
    }

    /// Tables nested directly in `table` (at level `depth`), resolved and
    /// anchored.
    ///
    /// Offsets are absolute positions in the composed grid
    /// [`resolve_at`](Self::resolve_at) produces for the same depth.
    pub fn extract(&self, table: &TableNode, depth: usize) -> Vec<NestedTableRef> {
        let parent = self.builder.build(table);
        let mut visited = HashSet::from([table.id]);
        let (stacks, _, _) = self.plan(table, &parent, depth, &mut visited);
        stacks.into_iter().flat_map(|stack| stack.tables).collect()
    }

    fn resolve_with(
        &self,
        table: &TableNode,
        depth: usize,
        visited: &mut HashSet<TableId>,
    ) -> Grid {
        if !visited.insert(table.id) {
            return Grid::empty();
        }

        let parent = self.builder.build(table);
        let (stacks, stretch, dropped) = self.plan(table, &parent, depth, visited);
        if stacks.is_empty() {
            let mut parent = parent;
            parent.merge_degradations(&dropped);
            return parent;
        }

        let mut grid = splice(&parent, stacks, &stretch);
        grid.merge_degradations(parent.degradations());
        grid.merge_degradations(&dropped);
        grid
    }

    /// Collect host stacks, stretch the parent around them and anchor every
    /// block. Returns the stacks, the stretch and the dropped-table counts.
    fn plan(
        &self,
        table: &TableNode,
        parent: &Grid,
        depth: usize,
        visited: &mut HashSet<TableId>,
    ) -> (Vec<HostStack>, Stretch, DegradationCounts) {
        let level = depth + 1;
        let mut dropped = DegradationCounts::default();
        let mut stacks = Vec::new();

        for (id, origin) in parent.origins().iter().enumerate() {
            let Some(source) = origin.source else {
                continue;
            };
            let cell = &table.rows[source.row].cells[source.cell];
            if !cell.has_nested_tables() {
                continue;
            }

            let mut stack = HostStack {
                host: id as OriginId,
                texts: Vec::new(),
                tables: Vec::new(),
                height: 0,
                width: 1,
            };
            for block in &cell.blocks {
                match block {
                    CellBlock::Text(text) => {
                        let text = truncate_chars(text.clone(), self.options.max_cell_length);
                        stack.texts.push((stack.height, text));
                        stack.height += 1;
                    },
                    CellBlock::Table(child) => {
                        if visited.contains(&child.id) {
                            continue;
                        }
                        if child.truncated || level > self.options.max_nested_depth {
                            visited.insert(child.id);
                            dropped.record(Degradation::NestedDepthExceeded);
                            debug!(depth = level, "nested table below depth limit dropped");
                            continue;
                        }
                        let grid = self.resolve_with(child, level, visited);
                        if grid.is_empty() {
                            continue;
                        }
                        let rows = grid.rows();
                        stack.width = stack.width.max(grid.cols());
                        stack.tables.push(NestedTableRef {
                            host: id as OriginId,
                            table: child.id,
                            depth: level,
                            row_offset: stack.height,
                            col_offset: 0,
                            grid,
                        });
                        stack.height += rows;
                    },
                }
            }

            // Hosts whose tables were all dropped stay ordinary cells.
            if !stack.tables.is_empty() {
                stacks.push(stack);
            }
        }

        let stretch = Stretch::new(parent, &stacks);
        for stack in &mut stacks {
            let host = parent.origin(stack.host);
            let (top, left) = (stretch.row_starts[host.row], stretch.col_starts[host.col]);
            for (row, _) in &mut stack.texts {
                *row += top;
            }
            for nested in &mut stack.tables {
                nested.row_offset += top;
                nested.col_offset = left;
            }
        }

        (stacks, stretch, dropped)
    }
}

/// Copy parent origins and anchored blocks into the composed grid.
fn splice(parent: &Grid, stacks: Vec<HostStack>, stretch: &Stretch) -> Grid {
    let mut grid = Grid::new(stretch.rows(), stretch.cols());
    let mut hosts: HashMap<OriginId, HostStack> =
        stacks.into_iter().map(|stack| (stack.host, stack)).collect();

    for (id, origin) in parent.origins().iter().enumerate() {
        let (top, left) = (stretch.row_starts[origin.row], stretch.col_starts[origin.col]);

        let Some(stack) = hosts.remove(&(id as OriginId)) else {
            let (rowspan, colspan) = if origin.is_merged() {
                (
                    stretch.row_starts[origin.row + origin.rowspan] - top,
                    stretch.col_starts[origin.col + origin.colspan] - left,
                )
            } else {
                (1, 1)
            };
            grid.claim(CellOrigin {
                row: top,
                col: left,
                rowspan,
                colspan,
                source: None,
                ..origin.clone()
            });
            continue;
        };

        for (row, text) in stack.texts {
            grid.claim(CellOrigin {
                text,
                row,
                col: left,
                rowspan: 1,
                colspan: 1,
                source: None,
                ..origin.clone()
            });
        }
        for nested in stack.tables {
            for child in nested.grid.origins() {
                grid.claim(CellOrigin {
                    row: nested.row_offset + child.row,
                    col: nested.col_offset + child.col,
                    source: None,
                    ..child.clone()
                });
            }
            grid.merge_degradations(nested.grid.degradations());
        }
    }

    grid
}
