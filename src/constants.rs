//! Application constants for the trip pipeline
//!
//! This module contains default values and canonical column names used
//! throughout the pipeline. The canonical trip schema itself is built in
//! [`crate::schema`].

// =============================================================================
// Canonical Column Names
// =============================================================================

/// Pickup timestamp column in the canonical trip schema
pub const PICKUP_DATETIME_COL: &str = "tpep_pickup_datetime";

/// Dropoff timestamp column in the canonical trip schema
pub const DROPOFF_DATETIME_COL: &str = "tpep_dropoff_datetime";

pub const PICKUP_LATITUDE_COL: &str = "pickup_latitude";
pub const PICKUP_LONGITUDE_COL: &str = "pickup_longitude";
pub const DROPOFF_LATITUDE_COL: &str = "dropoff_latitude";
pub const DROPOFF_LONGITUDE_COL: &str = "dropoff_longitude";

/// Timestamp format used by the trip record feeds
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Suffix appended to a coordinate-pair prefix to form its validity flag
/// column, e.g. `pickup_in_bounds`
pub const VALIDITY_FLAG_SUFFIX: &str = "_in_bounds";

/// Infix used to form spatial cell columns, e.g. `pickup_h3_r9`
pub const CELL_COLUMN_INFIX: &str = "_h3_r";

// =============================================================================
// Spatial Indexing Defaults
// =============================================================================

/// H3 resolution levels computed when none are configured (coarse to fine)
pub const DEFAULT_RESOLUTIONS: &[u8] = &[7, 8, 9];

/// Finest H3 resolution accepted in configuration
pub const MAX_H3_RESOLUTION: u8 = 15;

// =============================================================================
// Default Bounding Region (New York City)
// =============================================================================

pub const NYC_MIN_LATITUDE: f64 = 40.47;
pub const NYC_MAX_LATITUDE: f64 = 40.92;
pub const NYC_MIN_LONGITUDE: f64 = -74.28;
pub const NYC_MAX_LONGITUDE: f64 = -73.65;

// =============================================================================
// Concurrency Defaults
// =============================================================================

/// Upper bound for the auto-detected worker count
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// Hard cap on configured workers
pub const MAX_WORKERS: usize = 100;
