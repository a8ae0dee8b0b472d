//! Dense cell matrix of one laid-out table.

use std::sync::Arc;

use fixedbitset::FixedBitSet;

use crate::report::{Degradation, DegradationCounts};
use crate::style::{CellStyle, WidthHint};

/// Index of a [`CellOrigin`] inside its [`Grid`].
pub type OriginId = u32;

/// Position of a cell element inside its table: row index into
/// `TableNode::rows` and cell index into that row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: usize,
    pub cell: usize,
}

/// A cell as it lands on the grid, anchored at its top-left position.
#[derive(Debug, Clone, PartialEq)]
pub struct CellOrigin {
    pub text: String,
    pub style: Arc<CellStyle>,
    pub width_hint: WidthHint,
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
    /// Whether the cell came from a `<th>` element
    pub header: bool,
    /// Originating element; only set on grids fresh from the builder
    pub source: Option<CellRef>,
}

impl CellOrigin {
    /// Whether the origin covers more than one position.
    #[inline]
    pub fn is_merged(&self) -> bool {
        self.rowspan > 1 || self.colspan > 1
    }

    #[inline]
    fn contains(&self, row: usize, col: usize) -> bool {
        (self.row..self.row + self.rowspan).contains(&row)
            && (self.col..self.col + self.colspan).contains(&col)
    }
}

/// `rows x cols` matrix whose covered positions reference the origin
/// covering them.
///
/// Origins are only added through [`claim`](Self::claim), which refuses any
/// rectangle that leaves the grid or touches a covered position. Every grid
/// therefore tiles: each covered position belongs to exactly one origin and
/// each origin covers a gap-free `rowspan x colspan` rectangle.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<OriginId>>,
    occupied: FixedBitSet,
    origins: Vec<CellOrigin>,
    degradations: DegradationCounts,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        let size = rows * cols;
        Self {
            rows,
            cols,
            cells: vec![None; size],
            occupied: FixedBitSet::with_capacity(size),
            origins: Vec::new(),
            degradations: DegradationCounts::default(),
        }
    }

    /// Grid without rows or columns.
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Origin covering `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<OriginId> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[self.index(row, col)]
    }

    pub fn origin(&self, id: OriginId) -> &CellOrigin {
        &self.origins[id as usize]
    }

    /// Origin anchored exactly at `(row, col)`.
    pub fn origin_at(&self, row: usize, col: usize) -> Option<&CellOrigin> {
        self.get(row, col)
            .map(|id| self.origin(id))
            .filter(|origin| origin.row == row && origin.col == col)
    }

    /// All origins in placement order.
    pub fn origins(&self) -> &[CellOrigin] {
        &self.origins
    }

    /// Whether `(row, col)` lies inside the grid and is not yet covered.
    #[inline]
    pub fn is_free(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && !self.occupied.contains(self.index(row, col))
    }

    /// Place `origin` over its rectangle.
    ///
    /// Returns `None` and leaves the grid untouched when the rectangle is
    /// empty, leaves the grid or overlaps a covered position.
    pub fn claim(&mut self, origin: CellOrigin) -> Option<OriginId> {
        if origin.rowspan == 0 || origin.colspan == 0 {
            return None;
        }
        let (row_end, col_end) = (origin.row + origin.rowspan, origin.col + origin.colspan);
        if row_end > self.rows || col_end > self.cols {
            return None;
        }
        for row in origin.row..row_end {
            for col in origin.col..col_end {
                if !self.is_free(row, col) {
                    return None;
                }
            }
        }

        let id = OriginId::try_from(self.origins.len()).ok()?;
        for row in origin.row..row_end {
            for col in origin.col..col_end {
                let index = self.index(row, col);
                self.occupied.insert(index);
                self.cells[index] = Some(id);
            }
        }
        self.origins.push(origin);
        Some(id)
    }

    pub fn degradations(&self) -> &DegradationCounts {
        &self.degradations
    }

    pub fn record(&mut self, degradation: Degradation) {
        self.degradations.record(degradation);
    }

    pub(crate) fn merge_degradations(&mut self, counts: &DegradationCounts) {
        self.degradations.merge(counts);
    }

    /// Verify the tiling invariant.
    pub fn check_tiling(&self) -> bool {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let index = self.index(row, col);
                match self.cells[index] {
                    Some(id) => {
                        let Some(origin) = self.origins.get(id as usize) else {
                            return false;
                        };
                        if !origin.contains(row, col) || !self.occupied.contains(index) {
                            return false;
                        }
                    },
                    None if self.occupied.contains(index) => return false,
                    None => {},
                }
            }
        }

        self.origins.iter().enumerate().all(|(id, origin)| {
            origin.rowspan >= 1
                && origin.colspan >= 1
                && (origin.row..origin.row + origin.rowspan).all(|row| {
                    (origin.col..origin.col + origin.colspan)
                        .all(|col| self.get(row, col) == Some(id as OriginId))
                })
        })
    }
}
