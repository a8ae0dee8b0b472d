//! Column width heuristic.
//!
//! Widths are in character units of an 11 point font. Each emitted cell
//! proposes a width for the columns it spans; every column keeps the largest
//! proposal it has seen across all tables and documents.

use super::sink::SheetSink;
use crate::common::{Error, Result};
use crate::config::ConvertOptions;
use crate::style::{CellStyle, HorizontalAlign, WidthHint};

/// Font size the character unit is measured in.
const BASE_FONT_PT: f64 = 11.0;
const BOLD_FACTOR: f64 = 1.05;
const BORDER_ALLOWANCE: f64 = 0.5;
const ALIGN_ALLOWANCE: f64 = 0.5;

/// Width a cell asks for, clamped to the configured bounds but not yet
/// divided across its columns. Each column's share is clamped again by
/// [`ColumnWidthAccumulator::observe_span`].
pub fn estimate_cell_width(
    text: &str,
    style: &CellStyle,
    hint: &WidthHint,
    options: &ConvertOptions,
) -> f64 {
    let longest = text
        .lines()
        .map(|line| line.trim().chars().count())
        .max()
        .unwrap_or(0);

    let base = match hint.explicit {
        Some(explicit) => explicit,
        None if longest == 0 => return options.min_column_width,
        None => {
            let mut width = longest as f64 * style.font_size_pt() / BASE_FONT_PT;
            if style.bold {
                width *= BOLD_FACTOR;
            }
            width
        },
    };

    let mut width = base + hint.padding;
    if style.borders.has_vertical_edge() {
        width += BORDER_ALLOWANCE;
    }
    if matches!(style.align, HorizontalAlign::Center | HorizontalAlign::Right) {
        width += ALIGN_ALLOWANCE;
    }

    width.clamp(options.min_column_width, options.max_column_width)
}

/// Running maximum width per sheet column, kept within
/// `[min_width, max_width]`.
#[derive(Debug, Clone)]
pub struct ColumnWidthAccumulator {
    widths: Vec<Option<f64>>,
    min_width: f64,
    max_width: f64,
}

impl ColumnWidthAccumulator {
    pub fn new(min_width: f64, max_width: f64) -> Self {
        Self {
            widths: Vec::new(),
            min_width,
            max_width,
        }
    }

    /// Accumulator bounded by the column width options.
    pub fn from_options(options: &ConvertOptions) -> Self {
        Self::new(options.min_column_width, options.max_column_width)
    }

    /// Propose `width` for column `col`.
    pub fn observe(&mut self, col: u32, width: f64) {
        let width = width.clamp(self.min_width, self.max_width);
        let index = col as usize;
        if index >= self.widths.len() {
            self.widths.resize(index + 1, None);
        }
        let slot = &mut self.widths[index];
        *slot = Some(slot.map_or(width, |current| current.max(width)));
    }

    /// Propose `width` for `colspan` columns starting at `first_col`, split
    /// evenly between them. No share falls below the minimum width.
    pub fn observe_span(&mut self, first_col: u32, colspan: u32, width: f64) {
        let colspan = colspan.max(1);
        let share = width / colspan as f64;
        for col in first_col..first_col.saturating_add(colspan) {
            self.observe(col, share);
        }
    }

    pub fn get(&self, col: u32) -> Option<f64> {
        self.widths.get(col as usize).copied().flatten()
    }

    /// Observed columns with their widths, left to right.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.widths
            .iter()
            .enumerate()
            .filter_map(|(col, width)| width.map(|width| (col as u32, width)))
    }

    pub fn is_empty(&self) -> bool {
        self.widths.iter().all(Option::is_none)
    }

    /// Set every observed column's width on `sink`. Columns past the
    /// sink's last column are left out.
    pub fn apply<S: SheetSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        for (col, width) in self.iter() {
            match sink.set_column_width(col, width) {
                Ok(()) | Err(Error::OutOfRange { .. }) => {},
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{BorderKind, Borders};

    fn plain() -> CellStyle {
        CellStyle::plain(&ConvertOptions::default())
    }

    #[test]
    fn test_content_width() {
        let options = ConvertOptions::default();
        let hint = WidthHint::default();
        assert_eq!(estimate_cell_width("", &plain(), &hint, &options), 8.0);
        assert_eq!(estimate_cell_width("short", &plain(), &hint, &options), 8.0);
        assert_eq!(
            estimate_cell_width("twelve chars\nab", &plain(), &hint, &options),
            12.0
        );
        let long = "x".repeat(500);
        assert_eq!(estimate_cell_width(&long, &plain(), &hint, &options), 100.0);
    }

    #[test]
    fn test_style_adjustments() {
        let options = ConvertOptions::default();
        let hint = WidthHint::default();
        let text = "x".repeat(20);

        let bold = CellStyle {
            bold: true,
            ..plain()
        };
        assert!((estimate_cell_width(&text, &bold, &hint, &options) - 21.0).abs() < 1e-9);

        let large = CellStyle {
            font_size: 2200,
            ..plain()
        };
        assert_eq!(estimate_cell_width(&text, &large, &hint, &options), 40.0);

        let framed = CellStyle {
            borders: Borders {
                left: BorderKind::Solid,
                ..Borders::default()
            },
            align: HorizontalAlign::Right,
            ..plain()
        };
        assert_eq!(estimate_cell_width(&text, &framed, &hint, &options), 21.0);

        // Top and bottom borders take no horizontal room.
        let ruled = CellStyle {
            borders: Borders {
                top: BorderKind::Solid,
                bottom: BorderKind::Double,
                ..Borders::default()
            },
            ..plain()
        };
        assert_eq!(estimate_cell_width(&text, &ruled, &hint, &options), 20.0);
    }

    #[test]
    fn test_explicit_width_and_padding() {
        let options = ConvertOptions::default();
        let hint = WidthHint {
            explicit: Some(30.0),
            padding: 2.0,
        };
        assert_eq!(estimate_cell_width("a", &plain(), &hint, &options), 32.0);
        assert_eq!(estimate_cell_width("", &plain(), &hint, &options), 32.0);
    }

    #[test]
    fn test_accumulator_keeps_maximum_and_splits_spans() {
        let mut widths = ColumnWidthAccumulator::new(8.0, 100.0);
        widths.observe(0, 10.0);
        widths.observe(0, 8.0);
        widths.observe_span(1, 2, 30.0);
        widths.observe(2, 20.0);

        assert_eq!(widths.get(0), Some(10.0));
        assert_eq!(widths.get(1), Some(15.0));
        assert_eq!(widths.get(2), Some(20.0));
        assert_eq!(widths.get(3), None);
        assert_eq!(widths.iter().count(), 3);
    }

    #[test]
    fn test_span_shares_respect_minimum() {
        let options = ConvertOptions::default();
        let width = estimate_cell_width("a", &plain(), &WidthHint::default(), &options);
        let mut widths = ColumnWidthAccumulator::from_options(&options);
        widths.observe_span(0, 3, width);
        widths.observe(3, 500.0);

        for col in 0..3 {
            assert_eq!(widths.get(col), Some(8.0));
        }
        assert_eq!(widths.get(3), Some(100.0));
    }
}
