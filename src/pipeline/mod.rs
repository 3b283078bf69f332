//! Partition processing engine.
//!
//! Orchestrates the per-partition stage sequence (schema normalization,
//! coordinate validity, spatial indexing, temporal features, quality
//! assessment) and fans partitions out over a bounded pool of blocking
//! workers. Stages only ever see one partition; the sole cross-partition
//! state is the quality partial merge, which is order-insensitive.

pub mod normalize;
pub mod quality;
pub mod spatial;
pub mod temporal;
pub mod validate;

#[cfg(test)]
pub mod tests;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::{PartitionQuality, QualityReport, RunStats, RunSummary};
use crate::sink::PartitionSink;
use crate::source::PartitionSource;

use futures::stream::{self, StreamExt};
use h3o::Resolution;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs the full stage sequence over every partition of a source
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    resolutions: Vec<Resolution>,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let resolutions = config
            .resolutions
            .iter()
            .map(|&r| {
                Resolution::try_from(r).map_err(|_| {
                    PipelineError::configuration(format!("Invalid H3 resolution {}", r))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config: Arc::new(config),
            resolutions,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Column names every enriched partition must carry, in no particular
    /// order: the canonical columns plus every derived flag, cell-id and
    /// time-feature column.
    pub fn expected_output_columns(&self) -> Vec<String> {
        let schema = &self.config.schema;
        let mut columns = schema.names();

        for pair in schema.coordinate_pairs() {
            columns.push(pair.flag_name());
            for &resolution in &self.resolutions {
                columns.push(spatial::cell_column_name(&pair.prefix, resolution));
            }
        }
        for ts in schema.timestamp_columns() {
            columns.extend(temporal::time_column_names(&ts.prefix));
        }

        columns
    }

    /// Run the stage sequence over one partition, returning the enriched
    /// frame and its quality partial
    pub fn transform_partition(
        &self,
        df: &DataFrame,
        partition_id: &str,
    ) -> Result<(DataFrame, PartitionQuality)> {
        let schema = &self.config.schema;

        let normalized = normalize::normalize_partition(df, schema, partition_id)?;
        check_columns(&normalized, &schema.names(), partition_id)?;

        let annotated =
            validate::annotate_validity(normalized, schema, &self.config.bounding_box)?;
        let indexed = spatial::attach_cell_columns(annotated, schema, &self.resolutions)?;
        let enriched = temporal::attach_time_columns(indexed, schema)?;

        check_columns(&enriched, &self.expected_output_columns(), partition_id)?;

        let partial = quality::assess_partition(&enriched, schema);
        debug!(
            "Partition '{}': {} rows enriched to {} columns",
            partition_id,
            partial.rows,
            enriched.width()
        );

        Ok((enriched, partial))
    }

    /// Process every partition of `source`, writing enriched partitions to
    /// `sink` and returning the combined quality report.
    ///
    /// Partitions are processed concurrently and out of order; the report is
    /// identical regardless of completion order. Cancellation is honored at
    /// partition boundaries: partitions already scheduled run to completion,
    /// no further partitions are started, and the partial report over the
    /// completed partitions is returned with the cancelled flag set.
    pub async fn run(
        &self,
        source: &dyn PartitionSource,
        sink: Arc<dyn PartitionSink>,
        cancel: CancellationToken,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();

        let partitions = source.partitions()?;
        info!(
            "Processing {} partitions with {} workers",
            partitions.len(),
            self.config.workers
        );

        let pb = if self.config.show_progress {
            ProgressBar::new(partitions.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message("Processing partitions");

        let workers = self.config.workers.max(1);
        let mut results = stream::iter(partitions)
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|partition| {
                let pipeline = self.clone();
                let sink = Arc::clone(&sink);
                let pb = pb.clone();
                async move {
                    let id = partition.id().to_string();
                    pb.set_message(format!("Processing: {}", id));

                    let partial = task::spawn_blocking(move || {
                        let df = partition.read()?;
                        let (enriched, partial) =
                            pipeline.transform_partition(&df, partition.id())?;
                        sink.write(partition.id(), enriched)?;
                        Ok::<_, PipelineError>(partial)
                    })
                    .await
                    .map_err(|e| {
                        PipelineError::processing(&id, format!("Worker task failed: {}", e))
                    })?;

                    pb.inc(1);
                    partial
                }
            })
            .buffer_unordered(workers);

        let mut merged = PartitionQuality::default();
        let mut partitions_processed = 0usize;
        while let Some(result) = results.next().await {
            let partial = result?;
            merged.merge(&partial);
            partitions_processed += 1;
        }
        drop(results);

        let cancelled = cancel.is_cancelled();
        if cancelled {
            warn!(
                "Run cancelled after {} partitions; report covers completed partitions only",
                partitions_processed
            );
            pb.abandon_with_message("Cancelled");
        } else {
            pb.finish_with_message("All partitions processed");
        }

        let report = QualityReport::assemble(&self.config.schema, &merged);
        let stats = RunStats {
            partitions_processed,
            total_rows: merged.rows,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
            cancelled,
        };
        info!(
            "Run complete: {} partitions, {} rows in {}ms",
            stats.partitions_processed, stats.total_rows, stats.processing_time_ms
        );

        Ok(RunSummary { report, stats })
    }
}

/// Compare a partition's columns against an expected set, ignoring order
fn check_columns(df: &DataFrame, expected: &[String], partition_id: &str) -> Result<()> {
    let actual: BTreeSet<&str> = df.get_column_names_str().into_iter().collect();
    let expected: BTreeSet<&str> = expected.iter().map(String::as_str).collect();

    let missing: Vec<String> = expected
        .difference(&actual)
        .map(|s| s.to_string())
        .collect();
    let extra: Vec<String> = actual
        .difference(&expected)
        .map(|s| s.to_string())
        .collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::SchemaConsistency {
            partition: partition_id.to_string(),
            missing,
            extra,
        })
    }
}
