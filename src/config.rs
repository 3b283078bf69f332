//! Configuration management and validation.
//!
//! Provides the bounding region, spatial resolution levels, and concurrency
//! settings consumed by the pipeline. All configuration is immutable for the
//! duration of one run; stages receive it explicitly rather than resolving
//! anything from ambient state.

use crate::constants::{
    DEFAULT_RESOLUTIONS, MAX_DEFAULT_WORKERS, MAX_H3_RESOLUTION, MAX_WORKERS, NYC_MAX_LATITUDE,
    NYC_MAX_LONGITUDE, NYC_MIN_LATITUDE, NYC_MIN_LONGITUDE,
};
use crate::error::{PipelineError, Result};
use crate::schema::CanonicalSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geographic bounding region used for coordinate validity classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn new(min_latitude: f64, max_latitude: f64, min_longitude: f64, max_longitude: f64) -> Self {
        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }

    /// New York City region, matching the default trip schema
    pub fn nyc() -> Self {
        Self::new(
            NYC_MIN_LATITUDE,
            NYC_MAX_LATITUDE,
            NYC_MIN_LONGITUDE,
            NYC_MAX_LONGITUDE,
        )
    }

    /// Boundary-inclusive containment check
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }

    fn validate(&self) -> Result<()> {
        if self.min_latitude >= self.max_latitude {
            return Err(PipelineError::configuration(
                "min_latitude must be less than max_latitude",
            ));
        }
        if self.min_longitude >= self.max_longitude {
            return Err(PipelineError::configuration(
                "min_longitude must be less than max_longitude",
            ));
        }
        Ok(())
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::nyc()
    }
}

/// Global configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bounding region for coordinate validity flags
    pub bounding_box: BoundingBox,

    /// H3 resolution levels to compute, each producing an independent
    /// cell-id column per coordinate pair
    pub resolutions: Vec<u8>,

    /// Number of partitions processed concurrently
    pub workers: usize,

    /// Show a progress bar during processing
    pub show_progress: bool,

    /// Canonical trip schema; not part of the serialized configuration
    #[serde(skip)]
    pub schema: CanonicalSchema,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bounding_box: BoundingBox::nyc(),
            resolutions: DEFAULT_RESOLUTIONS.to_vec(),
            workers: num_cpus::get().min(MAX_DEFAULT_WORKERS),
            show_progress: true,
            schema: CanonicalSchema::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            PipelineError::configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the bounding region
    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Set the H3 resolution levels to compute
    pub fn with_resolutions(mut self, resolutions: Vec<u8>) -> Self {
        self.resolutions = resolutions;
        self
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Replace the canonical schema
    pub fn with_schema(mut self, schema: CanonicalSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Disable the progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Validate the configuration for one run
    pub fn validate(&self) -> Result<()> {
        self.bounding_box.validate()?;

        if self.resolutions.is_empty() {
            return Err(PipelineError::configuration(
                "At least one spatial resolution level is required",
            ));
        }
        for &resolution in &self.resolutions {
            if resolution > MAX_H3_RESOLUTION {
                return Err(PipelineError::configuration(format!(
                    "Invalid H3 resolution {} (must be 0..={})",
                    resolution, MAX_H3_RESOLUTION
                )));
            }
        }

        if self.workers == 0 {
            return Err(PipelineError::configuration(
                "Number of workers must be greater than 0",
            ));
        }
        if self.workers > MAX_WORKERS {
            return Err(PipelineError::configuration(format!(
                "Number of workers cannot exceed {}",
                MAX_WORKERS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_containment_is_inclusive() {
        let bbox = BoundingBox::new(40.47, 40.92, -74.28, -73.65);

        assert!(bbox.contains(40.7, -74.0));
        // Box edges are valid
        assert!(bbox.contains(40.47, -74.28));
        assert!(bbox.contains(40.92, -73.65));
        // Just outside
        assert!(!bbox.contains(40.93, -74.0));
        assert!(!bbox.contains(40.7, -73.64));
        assert!(!bbox.contains(91.0, -74.0));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_resolution_rejected() {
        let config = PipelineConfig::default().with_resolutions(vec![16]);
        assert!(config.validate().is_err());

        let config = PipelineConfig::default().with_resolutions(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_workers_rejected() {
        assert!(PipelineConfig::default().with_workers(0).validate().is_err());
        assert!(PipelineConfig::default()
            .with_workers(101)
            .validate()
            .is_err());
    }

    #[test]
    fn test_degenerate_bounding_box_rejected() {
        let config = PipelineConfig::default()
            .with_bounding_box(BoundingBox::new(40.9, 40.5, -74.3, -73.6));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_toml_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
resolutions = [8, 9]
workers = 2

[bounding_box]
min_latitude = 40.0
max_latitude = 41.0
min_longitude = -75.0
max_longitude = -73.0
"#
        )
        .unwrap();

        let config = PipelineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.resolutions, vec![8, 9]);
        assert_eq!(config.workers, 2);
        assert_eq!(config.bounding_box.min_latitude, 40.0);
        // Unspecified fields fall back to defaults
        assert!(config.show_progress);
    }
}
