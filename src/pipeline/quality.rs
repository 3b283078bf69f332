//! Partitioned quality assessment stage.
//!
//! Computes each partition's quality partial (row count, per-column null
//! counts, per-flag valid counts) in isolation. Partials are reduced by
//! summation in [`crate::models::PartitionQuality::merge`] and normalized
//! into percentages exactly once, in
//! [`crate::models::QualityReport::assemble`], so the full dataset never
//! has to be resident and partition order never matters.

use crate::models::PartitionQuality;
use crate::schema::CanonicalSchema;
use polars::prelude::*;

/// Compute the quality partial for one enriched partition
pub fn assess_partition(df: &DataFrame, schema: &CanonicalSchema) -> PartitionQuality {
    let mut partial = PartitionQuality {
        rows: df.height(),
        ..Default::default()
    };

    for column in schema.iter() {
        if let Ok(series) = df.column(&column.name) {
            partial
                .null_counts
                .insert(column.name.clone(), series.null_count());
        }
    }

    for pair in schema.coordinate_pairs() {
        let flag = pair.flag_name();
        if let Ok(column) = df.column(&flag) {
            if let Ok(mask) = column.as_materialized_series().bool() {
                let valid = mask.sum().unwrap_or(0) as usize;
                partial.valid_counts.insert(flag, valid);
            }
        }
    }

    partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundingBox;
    use crate::models::QualityReport;
    use crate::pipeline::{normalize::normalize_partition, validate::annotate_validity};

    fn schema() -> CanonicalSchema {
        CanonicalSchema::nyc_yellow()
    }

    fn enriched(fares: Vec<Option<f64>>, lats: Vec<Option<f64>>) -> DataFrame {
        let df = DataFrame::new(vec![
            Series::new("fare_amount".into(), fares).into(),
            Series::new("pickup_latitude".into(), lats.clone()).into(),
            Series::new(
                "pickup_longitude".into(),
                vec![Some(-74.0); lats.len()],
            )
            .into(),
        ])
        .unwrap();
        let df = normalize_partition(&df, &schema(), "test").unwrap();
        annotate_validity(df, &schema(), &BoundingBox::nyc()).unwrap()
    }

    #[test]
    fn test_partial_counts_nulls_and_valid_flags() {
        let df = enriched(
            vec![Some(10.0), None, Some(8.0)],
            vec![Some(40.7), Some(40.8), Some(2.0)],
        );

        let partial = assess_partition(&df, &schema());

        assert_eq!(partial.rows, 3);
        assert_eq!(partial.null_counts["fare_amount"], 1);
        // Columns missing from the source are all-null after normalization
        assert_eq!(partial.null_counts["tip_amount"], 3);
        assert_eq!(partial.valid_counts["pickup_in_bounds"], 2);
    }

    #[test]
    fn test_partitioning_invariance() {
        // The same rows split {3} vs {1, 2} must produce the same report.
        let whole = enriched(
            vec![Some(10.0), None, Some(8.0)],
            vec![Some(40.7), Some(40.8), Some(2.0)],
        );
        let head = enriched(vec![Some(10.0)], vec![Some(40.7)]);
        let tail = enriched(vec![None, Some(8.0)], vec![Some(40.8), Some(2.0)]);

        let mut split = assess_partition(&head, &schema());
        split.merge(&assess_partition(&tail, &schema()));
        let unsplit = assess_partition(&whole, &schema());

        assert_eq!(split, unsplit);
        assert_eq!(
            QualityReport::assemble(&schema(), &split),
            QualityReport::assemble(&schema(), &unsplit)
        );
    }

    #[test]
    fn test_zero_row_partition_contributes_zeros() {
        let df = enriched(vec![], vec![]);
        let partial = assess_partition(&df, &schema());

        assert_eq!(partial.rows, 0);
        assert_eq!(partial.null_counts["fare_amount"], 0);
        assert_eq!(partial.valid_counts["pickup_in_bounds"], 0);
    }
}
