//! Core data structures for pipeline results.
//!
//! Defines the per-partition quality partials, the combined quality report,
//! and run statistics returned by the orchestrator.

use crate::schema::CanonicalSchema;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-partition quality partial: row count, per-column null counts and
/// per-flag-column valid counts.
///
/// Partials from any number of partitions combine via [`merge`](Self::merge),
/// which is commutative and associative, so partition arrival order never
/// affects the final report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionQuality {
    pub rows: usize,
    pub null_counts: BTreeMap<String, usize>,
    pub valid_counts: BTreeMap<String, usize>,
}

impl PartitionQuality {
    /// Fold another partial into this one by summation
    pub fn merge(&mut self, other: &PartitionQuality) {
        self.rows += other.rows;
        for (column, count) in &other.null_counts {
            *self.null_counts.entry(column.clone()).or_insert(0) += count;
        }
        for (column, count) in &other.valid_counts {
            *self.valid_counts.entry(column.clone()).or_insert(0) += count;
        }
    }
}

/// Null statistics for one canonical column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnQuality {
    pub null_count: usize,
    /// `None` for a zero-row dataset (undefined, not 0.0)
    pub null_percentage: Option<f64>,
}

/// Validity statistics for one coordinate flag column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateQuality {
    pub valid_count: usize,
    /// `None` for a zero-row dataset (undefined, not 0.0)
    pub valid_percentage: Option<f64>,
}

/// Aggregate quality report for one pipeline run, immutable after assembly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub total_rows: usize,
    pub columns: BTreeMap<String, ColumnQuality>,
    pub coordinates: BTreeMap<String, CoordinateQuality>,
}

impl QualityReport {
    /// Assemble the report from the merged partition partials.
    ///
    /// Percentages are computed exactly once here, against the full row
    /// count; per-partition percentages are never meaningful on their own.
    /// Every canonical column and flag column appears in the report even if
    /// no partition contributed counts for it.
    pub fn assemble(schema: &CanonicalSchema, merged: &PartitionQuality) -> Self {
        let total_rows = merged.rows;
        let percentage = |count: usize| {
            if total_rows == 0 {
                None
            } else {
                Some(count as f64 / total_rows as f64 * 100.0)
            }
        };

        let mut columns = BTreeMap::new();
        for column in schema.iter() {
            let null_count = merged.null_counts.get(&column.name).copied().unwrap_or(0);
            columns.insert(
                column.name.clone(),
                ColumnQuality {
                    null_count,
                    null_percentage: percentage(null_count),
                },
            );
        }

        let mut coordinates = BTreeMap::new();
        for pair in schema.coordinate_pairs() {
            let flag = pair.flag_name();
            let valid_count = merged.valid_counts.get(&flag).copied().unwrap_or(0);
            coordinates.insert(
                flag,
                CoordinateQuality {
                    valid_count,
                    valid_percentage: percentage(valid_count),
                },
            );
        }

        Self {
            total_rows,
            columns,
            coordinates,
        }
    }
}

/// Statistics for one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub partitions_processed: usize,
    pub total_rows: usize,
    pub processing_time_ms: u64,
    /// True when the caller abandoned the run before all partitions were
    /// scheduled
    pub cancelled: bool,
}

/// Result of one completed pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: QualityReport,
    pub stats: RunStats,
}
