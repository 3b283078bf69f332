//! Command-line argument definitions for the trip pipeline
//!
//! Defines the complete CLI interface using the clap derive API.

use crate::config::{BoundingBox, PipelineConfig};
use crate::constants::MAX_H3_RESOLUTION;
use crate::error::{PipelineError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the trip feature pipeline
///
/// Converts partitioned taxi trip record CSV files into spatially and
/// temporally indexed Parquet feature sets.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tripgrid",
    version,
    about = "Convert partitioned trip records into H3-indexed Parquet feature sets",
    long_about = "Processes partitioned taxi trip record CSV files into enriched Parquet \
                  partitions: schemas are reconciled against a canonical trip schema, \
                  coordinates are validity-flagged and indexed into hierarchical H3 cells \
                  at multiple resolutions, and timestamps are expanded into temporal \
                  features. A dataset-wide data quality report is produced on every run."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Process trip partitions into enriched Parquet files (main command)
    Process(ProcessArgs),
    /// Compute the quality report without writing enriched partitions
    Report(ReportArgs),
}

/// Arguments for the process command
#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Glob pattern matching the input CSV partitions
    ///
    /// Each matching file is treated as one partition, e.g.
    /// "data/yellow_tripdata_2015-*.csv".
    #[arg(value_name = "PATTERN", help = "Glob pattern matching input CSV partitions")]
    pub input: String,

    /// Output directory for enriched Parquet partitions
    ///
    /// Will be created if it doesn't exist. One Parquet file is written
    /// per input partition, named after the partition.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "./output",
        help = "Output directory for enriched Parquet partitions"
    )]
    pub output: PathBuf,

    /// H3 resolution levels to compute (comma-separated list)
    ///
    /// Each level produces an independent cell-id column per coordinate
    /// pair. Defaults to 7,8,9 when not specified.
    #[arg(
        short = 'r',
        long = "resolutions",
        value_name = "LIST",
        help = "Comma-separated H3 resolution levels (0-15)"
    )]
    pub resolutions: Option<ResolutionList>,

    /// Bounding region for coordinate validity flags
    ///
    /// Specify as min_lat,max_lat,min_lon,max_lon. Defaults to the New
    /// York City region.
    #[arg(
        long = "region",
        value_name = "BBOX",
        help = "Bounding region as min_lat,max_lat,min_lon,max_lon"
    )]
    pub region: Option<String>,

    /// Number of parallel workers
    ///
    /// Controls how many partitions are processed concurrently. Defaults
    /// to the CPU count, capped at 8.
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        help = "Number of partitions processed concurrently"
    )]
    pub workers: Option<usize>,

    /// Path to configuration file
    ///
    /// TOML configuration file for advanced settings. CLI flags override
    /// values from the file.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Also disables the progress bar.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for the quality report
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for the quality report"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the report command
#[derive(Debug, Clone, Parser)]
pub struct ReportArgs {
    /// Glob pattern matching the input CSV partitions
    #[arg(value_name = "PATTERN", help = "Glob pattern matching input CSV partitions")]
    pub input: String,

    /// Bounding region for coordinate validity flags
    #[arg(
        long = "region",
        value_name = "BBOX",
        help = "Bounding region as min_lat,max_lat,min_lon,max_lon"
    )]
    pub region: Option<String>,

    /// Number of parallel workers
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        help = "Number of partitions processed concurrently"
    )]
    pub workers: Option<usize>,

    /// Path to configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for the quality report
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for the quality report"
    )]
    pub output_format: OutputFormat,
}

/// Output format options for the quality report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// Wrapper for parsing comma-separated resolution lists
#[derive(Debug, Clone)]
pub struct ResolutionList {
    pub resolutions: Vec<u8>,
}

impl FromStr for ResolutionList {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let resolutions: Vec<u8> = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u8>()
                    .map_err(|_| {
                        PipelineError::configuration(format!("Invalid resolution '{}'", part))
                    })
                    .and_then(|r| {
                        if r > MAX_H3_RESOLUTION {
                            Err(PipelineError::configuration(format!(
                                "Resolution {} out of range (0..={})",
                                r, MAX_H3_RESOLUTION
                            )))
                        } else {
                            Ok(r)
                        }
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        if resolutions.is_empty() {
            return Err(PipelineError::configuration(
                "Resolution list cannot be empty",
            ));
        }

        Ok(ResolutionList { resolutions })
    }
}

/// Parse a bounding region string of the form min_lat,max_lat,min_lon,max_lon
pub fn parse_region(region: &str) -> Result<BoundingBox> {
    let parts: Vec<f64> = region
        .split(',')
        .map(str::trim)
        .map(|part| {
            part.parse::<f64>().map_err(|_| {
                PipelineError::configuration(format!(
                    "Invalid region component '{}' (expected min_lat,max_lat,min_lon,max_lon)",
                    part
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if parts.len() != 4 {
        return Err(PipelineError::configuration(
            "Region must have exactly four components: min_lat,max_lat,min_lon,max_lon",
        ));
    }

    Ok(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
}

impl ProcessArgs {
    /// Build the pipeline configuration: config file values first, then
    /// CLI flag overrides on top
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config_file {
            Some(path) => PipelineConfig::from_toml_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(list) = &self.resolutions {
            config = config.with_resolutions(list.resolutions.clone());
        }
        if let Some(region) = &self.region {
            config = config.with_bounding_box(parse_region(region)?);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.quiet {
            config = config.without_progress();
        }

        config.validate()?;
        Ok(config)
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.quiet, self.verbose)
    }
}

impl ReportArgs {
    /// Build the pipeline configuration for a report-only run
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config_file {
            Some(path) => PipelineConfig::from_toml_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(region) = &self.region {
            config = config.with_bounding_box(parse_region(region)?);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.quiet {
            config = config.without_progress();
        }

        config.validate()?;
        Ok(config)
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.quiet, self.verbose)
    }
}

fn log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
