//! Error handling for trip record processing operations.
//!
//! Provides error types with context for partition sourcing, schema
//! reconciliation, and pipeline execution failures. Row-level problems
//! (unparsable coordinates or timestamps) are never errors: the stages
//! absorb them into null derived values.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid partition pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("No partitions matched input pattern: {pattern}")]
    SourceUnavailable { pattern: String },

    #[error(
        "Schema mismatch in partition '{partition}': missing columns {missing:?}, unexpected columns {extra:?}"
    )]
    SchemaConsistency {
        partition: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("Processing failed for partition '{partition}': {reason}")]
    Processing { partition: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl PipelineError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a partition processing error with context
    pub fn processing(partition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Processing {
            partition: partition.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
