//! Partition sinks for the pipeline output boundary.
//!
//! The pipeline does not own a storage backend; enriched partitions are
//! handed to whatever [`PartitionSink`] the caller supplies. A Parquet
//! directory sink is provided for the CLI, a collecting sink for tests, and
//! a null sink for quality-report-only runs.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Consumer of enriched partitions; one call per completed partition
pub trait PartitionSink: Send + Sync {
    fn write(&self, partition_id: &str, df: DataFrame) -> Result<()>;
}

/// Writes each enriched partition as `<partition_id>.parquet` in a directory
#[derive(Debug)]
pub struct ParquetDirSink {
    output_dir: PathBuf,
}

impl ParquetDirSink {
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }
}

impl PartitionSink for ParquetDirSink {
    fn write(&self, partition_id: &str, mut df: DataFrame) -> Result<()> {
        let path = self.output_dir.join(format!("{}.parquet", sanitize(partition_id)));
        debug!("Writing {} rows to {}", df.height(), path.display());

        let file = File::create(&path)?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| PipelineError::Processing {
                partition: partition_id.to_string(),
                reason: format!("Failed to write parquet to {}: {}", path.display(), e),
            })?;

        Ok(())
    }
}

/// Collects enriched partitions in memory; used by tests
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Mutex<Vec<(String, DataFrame)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the collected partitions, leaving the sink empty
    pub fn take(&self) -> Vec<(String, DataFrame)> {
        std::mem::take(&mut self.frames.lock().expect("sink poisoned"))
    }
}

impl PartitionSink for MemorySink {
    fn write(&self, partition_id: &str, df: DataFrame) -> Result<()> {
        self.frames
            .lock()
            .expect("sink poisoned")
            .push((partition_id.to_string(), df));
        Ok(())
    }
}

/// Discards enriched partitions; used for report-only runs
#[derive(Debug, Default)]
pub struct NullSink;

impl PartitionSink for NullSink {
    fn write(&self, _partition_id: &str, _df: DataFrame) -> Result<()> {
        Ok(())
    }
}

/// Keep partition-derived file names filesystem-safe
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parquet_sink_writes_one_file_per_partition() {
        let temp_dir = TempDir::new().unwrap();
        let sink = ParquetDirSink::new(temp_dir.path().join("out")).unwrap();

        let df = polars::df!("fare_amount" => [10.0f64, 12.5]).unwrap();
        sink.write("trips_01", df).unwrap();

        let path = temp_dir.path().join("out").join("trips_01.parquet");
        assert!(path.exists());

        let restored = ParquetReader::new(File::open(path).unwrap())
            .finish()
            .unwrap();
        assert_eq!(restored.height(), 2);
    }

    #[test]
    fn test_memory_sink_collects_partitions() {
        let sink = MemorySink::new();
        let df = polars::df!("a" => [1i32]).unwrap();

        sink.write("p1", df.clone()).unwrap();
        sink.write("p2", df).unwrap();

        let collected = sink.take();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].0, "p1");
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize("trips_2015-01"), "trips_2015-01");
        assert_eq!(sanitize("a/b c"), "a_b_c");
    }
}
