//! Conversion statistics.

use std::time::Duration;

use crate::style::CacheStats;

/// A recoverable problem in the input that changed the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Degradation {
    /// A style declaration could not be read and fell back to its default
    StyleParse,
    /// A cell's span overlapped an earlier cell and was shrunk
    SpanConflict,
    /// The sink refused a merge range; the origin cell was written alone
    MergeRejected,
    /// A nested table sat below the depth limit and was dropped
    NestedDepthExceeded,
    /// A cell found no free column in its row and was left out
    CellDropped,
    /// A cell fell past the sink's last row or column and was skipped
    OutOfRange,
}

/// Counts of every [`Degradation`] kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DegradationCounts {
    pub style_parse: usize,
    pub span_conflicts: usize,
    pub merges_rejected: usize,
    pub nested_dropped: usize,
    pub cells_dropped: usize,
    pub out_of_range: usize,
}

impl DegradationCounts {
    pub fn record(&mut self, degradation: Degradation) {
        match degradation {
            Degradation::StyleParse => self.style_parse += 1,
            Degradation::SpanConflict => self.span_conflicts += 1,
            Degradation::MergeRejected => self.merges_rejected += 1,
            Degradation::NestedDepthExceeded => self.nested_dropped += 1,
            Degradation::CellDropped => self.cells_dropped += 1,
            Degradation::OutOfRange => self.out_of_range += 1,
        }
    }

    pub fn merge(&mut self, other: &DegradationCounts) {
        self.style_parse += other.style_parse;
        self.span_conflicts += other.span_conflicts;
        self.merges_rejected += other.merges_rejected;
        self.nested_dropped += other.nested_dropped;
        self.cells_dropped += other.cells_dropped;
        self.out_of_range += other.out_of_range;
    }

    pub fn total(&self) -> usize {
        self.style_parse
            + self.span_conflicts
            + self.merges_rejected
            + self.nested_dropped
            + self.cells_dropped
            + self.out_of_range
    }
}

/// Summary of one conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    /// Non-blank documents found in the input
    pub documents: usize,
    /// Top-level tables written to the sheet
    pub tables: usize,
    /// Tables skipped because they were hidden
    pub hidden_tables: usize,
    /// Grid rows written, spacing rows excluded
    pub rows: usize,
    /// Origin cells written
    pub cells: usize,
    /// Merge ranges accepted by the sink
    pub merges: usize,
    pub degradations: DegradationCounts,
    pub cache: CacheStats,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut counts = DegradationCounts::default();
        counts.record(Degradation::SpanConflict);
        counts.record(Degradation::SpanConflict);
        counts.record(Degradation::StyleParse);

        let mut other = DegradationCounts::default();
        other.record(Degradation::NestedDepthExceeded);
        other.record(Degradation::MergeRejected);
        other.record(Degradation::CellDropped);
        other.record(Degradation::OutOfRange);
        counts.merge(&other);

        assert_eq!(counts.span_conflicts, 2);
        assert_eq!(counts.style_parse, 1);
        assert_eq!(counts.nested_dropped, 1);
        assert_eq!(counts.merges_rejected, 1);
        assert_eq!(counts.cells_dropped, 1);
        assert_eq!(counts.out_of_range, 1);
        assert_eq!(counts.total(), 7);
    }
}
