//! Partition sources for the pipeline input boundary.
//!
//! A [`PartitionSource`] supplies a finite, restartable sequence of
//! [`Partition`] handles; reading a partition is deferred until a worker is
//! ready for it, and a handle may be read again if an external engine retries
//! it. The pipeline owns no file-format contract beyond the CSV reader
//! provided here; any source implementing the trait can feed a run.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// One lazily-readable chunk of the full record set
pub trait Partition: Send + Sync {
    /// Stable identifier used in logs, errors and sink output names
    fn id(&self) -> &str;

    /// Materialize this partition's records. May be called more than once;
    /// every call must produce the same data.
    fn read(&self) -> Result<DataFrame>;
}

/// Supplier of the partitions for one run
pub trait PartitionSource: Send + Sync {
    /// Enumerate the partitions. Calling this again restarts the sequence.
    fn partitions(&self) -> Result<Vec<Box<dyn Partition>>>;
}

/// Partition source backed by CSV files matching a glob pattern
#[derive(Debug, Clone)]
pub struct CsvPartitionSource {
    pattern: String,
}

impl CsvPartitionSource {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl PartitionSource for CsvPartitionSource {
    fn partitions(&self) -> Result<Vec<Box<dyn Partition>>> {
        let mut paths: Vec<PathBuf> = glob::glob(&self.pattern)?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();

        if paths.is_empty() {
            return Err(PipelineError::SourceUnavailable {
                pattern: self.pattern.clone(),
            });
        }

        // Deterministic enumeration order; processing order is still
        // unordered across workers.
        paths.sort();

        debug!("Found {} partitions for pattern {}", paths.len(), self.pattern);

        Ok(paths
            .into_iter()
            .map(|path| {
                let id = partition_id(&path);
                Box::new(CsvPartition { id, path }) as Box<dyn Partition>
            })
            .collect())
    }
}

/// A single CSV file treated as one partition
struct CsvPartition {
    id: String,
    path: PathBuf,
}

impl Partition for CsvPartition {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> Result<DataFrame> {
        debug!("Reading partition from {}", self.path.display());

        // Every column is read as a string; the schema normalizer owns all
        // type coercion, so per-file inference differences cannot leak into
        // cross-partition schemas.
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_ignore_errors(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(self.path.clone()))?
            .finish()?;

        Ok(df)
    }
}

/// Derive a partition identifier from a file path
fn partition_id(path: &PathBuf) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// In-memory partition source for tests and embedded use
#[derive(Debug, Clone, Default)]
pub struct MemoryPartitionSource {
    partitions: Vec<(String, DataFrame)>,
}

impl MemoryPartitionSource {
    pub fn new(partitions: Vec<(String, DataFrame)>) -> Self {
        Self { partitions }
    }
}

impl PartitionSource for MemoryPartitionSource {
    fn partitions(&self) -> Result<Vec<Box<dyn Partition>>> {
        Ok(self
            .partitions
            .iter()
            .map(|(id, df)| {
                Box::new(MemoryPartition {
                    id: id.clone(),
                    frame: df.clone(),
                }) as Box<dyn Partition>
            })
            .collect())
    }
}

struct MemoryPartition {
    id: String,
    frame: DataFrame,
}

impl Partition for MemoryPartition {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> Result<DataFrame> {
        Ok(self.frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_csv_source_discovers_matching_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("trips_01.csv"),
            "pickup_latitude,pickup_longitude\n40.7,-74.0\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("trips_02.csv"),
            "pickup_latitude,pickup_longitude\n40.8,-73.9\n",
        )
        .unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "not a partition").unwrap();

        let pattern = temp_dir.path().join("*.csv").display().to_string();
        let source = CsvPartitionSource::new(pattern);
        let partitions = source.partitions().unwrap();

        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].id(), "trips_01");
        assert_eq!(partitions[1].id(), "trips_02");
    }

    #[test]
    fn test_csv_source_with_no_matches_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let pattern = temp_dir.path().join("*.csv").display().to_string();

        let source = CsvPartitionSource::new(pattern.clone());
        match source.partitions() {
            Err(PipelineError::SourceUnavailable { pattern: p }) => assert_eq!(p, pattern),
            other => panic!("Expected SourceUnavailable, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn test_csv_partition_reads_all_columns_as_strings() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("trips.csv"),
            "fare_amount,pickup_latitude\n12.5,40.7\nbad,41.0\n",
        )
        .unwrap();

        let pattern = temp_dir.path().join("*.csv").display().to_string();
        let partitions = CsvPartitionSource::new(pattern).partitions().unwrap();
        let df = partitions[0].read().unwrap();

        assert_eq!(df.height(), 2);
        for column in df.get_columns() {
            assert_eq!(column.dtype(), &DataType::String);
        }
    }

    #[test]
    fn test_memory_partition_is_restartable() {
        let df = polars::df!("a" => [1i32, 2, 3]).unwrap();
        let source = MemoryPartitionSource::new(vec![("p0".to_string(), df.clone())]);

        let partitions = source.partitions().unwrap();
        let first = partitions[0].read().unwrap();
        let second = partitions[0].read().unwrap();

        assert_eq!(first, df);
        assert_eq!(second, df);
    }
}
