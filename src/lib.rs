//! Tripgrid
//!
//! A Rust library for turning partitioned taxi trip records into
//! spatially and temporally indexed feature sets written as Apache
//! Parquet files.
//!
//! This library provides tools for:
//! - Reconciling inconsistent partition schemas against a canonical
//!   trip schema
//! - Flagging coordinate validity against a configurable bounding region
//! - Indexing pickup and dropoff locations into hierarchical H3 cells at
//!   multiple resolution levels
//! - Deriving hour, day-of-week, month and date features from trip
//!   timestamps
//! - Assessing data quality across partitions without materializing the
//!   full dataset
//! - Concurrent partition processing with graceful cancellation

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod source;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::{BoundingBox, PipelineConfig};
pub use error::{PipelineError, Result};
pub use models::{QualityReport, RunStats, RunSummary};
pub use pipeline::Pipeline;
pub use schema::CanonicalSchema;
