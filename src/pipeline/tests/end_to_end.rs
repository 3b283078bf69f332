//! End-to-end pipeline runs over in-memory partition sources

use crate::config::PipelineConfig;
use crate::pipeline::Pipeline;
use crate::sink::MemorySink;
use crate::source::MemoryPartitionSource;
use polars::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn test_pipeline() -> Pipeline {
    let config = PipelineConfig::default().with_workers(2).without_progress();
    Pipeline::new(config).unwrap()
}

fn trips_partition() -> DataFrame {
    polars::df!(
        "VendorID" => ["1", "2", "1"],
        "tpep_pickup_datetime" => ["2015-01-15 19:05:39", "2015-01-15 08:30:00", "bad"],
        "pickup_latitude" => ["40.7484", "40.7", "91.0"],
        "pickup_longitude" => ["-73.9857", "-74.0", "-74.0"],
        "fare_amount" => ["12.5", "", "8.0"],
    )
    .unwrap()
}

#[tokio::test]
async fn test_run_enriches_every_partition() {
    let pipeline = test_pipeline();
    let source = MemoryPartitionSource::new(vec![
        ("trips_01".to_string(), trips_partition()),
        ("trips_02".to_string(), trips_partition()),
    ]);
    let sink = Arc::new(MemorySink::new());

    let summary = pipeline
        .run(&source, sink.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert!(!summary.stats.cancelled);
    assert_eq!(summary.stats.partitions_processed, 2);
    assert_eq!(summary.stats.total_rows, 6);

    let written = sink.take();
    assert_eq!(written.len(), 2);

    let expected = pipeline.expected_output_columns();
    for (_, df) in &written {
        assert_eq!(df.width(), expected.len());
        for column in &expected {
            assert!(df.column(column).is_ok(), "missing column {}", column);
        }
    }
}

#[tokio::test]
async fn test_run_report_combines_partitions() {
    let pipeline = test_pipeline();
    // fare_amount nulls: 1 per partition (the empty string); pickup validity:
    // 2 of 3 rows per partition (latitude 91 is out of bounds).
    let source = MemoryPartitionSource::new(vec![
        ("a".to_string(), trips_partition()),
        ("b".to_string(), trips_partition()),
    ]);

    let summary = pipeline
        .run(&source, Arc::new(MemorySink::new()), CancellationToken::new())
        .await
        .unwrap();
    let report = summary.report;

    assert_eq!(report.total_rows, 6);

    let fare = &report.columns["fare_amount"];
    assert_eq!(fare.null_count, 2);
    assert!((fare.null_percentage.unwrap() - 100.0 * 2.0 / 6.0).abs() < 1e-9);

    let pickup = &report.coordinates["pickup_in_bounds"];
    assert_eq!(pickup.valid_count, 4);
    assert!((pickup.valid_percentage.unwrap() - 100.0 * 4.0 / 6.0).abs() < 1e-9);

    // Columns absent from every partition are fully null
    assert_eq!(report.columns["tip_amount"].null_count, 6);
}

#[tokio::test]
async fn test_case_variant_partitions_produce_identical_layouts() {
    let pipeline = test_pipeline();
    let p1 = polars::df!(
        "RateCodeID" => ["1"],
        "pickup_latitude" => ["40.7"],
        "pickup_longitude" => ["-74.0"],
    )
    .unwrap();
    let p2 = polars::df!(
        "RatecodeID" => ["2"],
        "Pickup_Latitude" => ["40.8"],
        "Pickup_Longitude" => ["-73.9"],
    )
    .unwrap();
    let source =
        MemoryPartitionSource::new(vec![("p1".to_string(), p1), ("p2".to_string(), p2)]);
    let sink = Arc::new(MemorySink::new());

    pipeline
        .run(&source, sink.clone(), CancellationToken::new())
        .await
        .unwrap();

    let written = sink.take();
    assert_eq!(written.len(), 2);
    let mut names: Vec<Vec<String>> = written
        .iter()
        .map(|(_, df)| {
            let mut n: Vec<String> = df
                .get_column_names_str()
                .into_iter()
                .map(String::from)
                .collect();
            n.sort();
            n
        })
        .collect();
    names.dedup();
    assert_eq!(names.len(), 1);
}

#[tokio::test]
async fn test_empty_source_yields_undefined_percentages() {
    let pipeline = test_pipeline();
    let source = MemoryPartitionSource::new(vec![]);

    let summary = pipeline
        .run(&source, Arc::new(MemorySink::new()), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.stats.partitions_processed, 0);
    assert_eq!(summary.report.total_rows, 0);
    for quality in summary.report.columns.values() {
        assert_eq!(quality.null_percentage, None);
    }
    for quality in summary.report.coordinates.values() {
        assert_eq!(quality.valid_percentage, None);
    }
}

#[test]
fn test_transform_produces_expected_column_count() {
    let pipeline = test_pipeline();

    let (enriched, partial) = pipeline
        .transform_partition(&trips_partition(), "trips")
        .unwrap();

    // 19 canonical + 2 flags + 2 pairs x 3 resolutions + 2 timestamps x 4
    assert_eq!(enriched.width(), 35);
    assert_eq!(pipeline.expected_output_columns().len(), 35);
    assert_eq!(partial.rows, 3);
}

#[test]
fn test_invalid_configuration_rejected_at_construction() {
    let config = PipelineConfig::default().with_resolutions(vec![16]);
    assert!(Pipeline::new(config).is_err());

    let config = PipelineConfig::default().with_workers(0);
    assert!(Pipeline::new(config).is_err());
}
