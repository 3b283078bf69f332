//! Canonical trip schema and physical-name reconciliation.
//!
//! Input partitions arrive with inconsistent physical column names
//! (`RateCodeID`, `RatecodeID`, `ratecode_id` are all the same logical
//! field). The [`CanonicalSchema`] is the single agreed column-name/type
//! contract every partition must satisfy before any cross-partition
//! operation; it is built once from configuration and read-only for the
//! duration of a run.

use crate::constants::{
    DROPOFF_DATETIME_COL, DROPOFF_LATITUDE_COL, DROPOFF_LONGITUDE_COL, PICKUP_DATETIME_COL,
    PICKUP_LATITUDE_COL, PICKUP_LONGITUDE_COL, VALIDITY_FLAG_SUFFIX,
};
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic role of a canonical column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Latitude or longitude component of a coordinate pair
    Coordinate,
    /// Timestamp column feeding the temporal feature extractor
    Timestamp,
    /// Numeric fare/trip attribute
    Measure,
    /// Categorical code (vendor, payment type, rate code)
    Categorical,
}

/// One column of the canonical logical schema
#[derive(Debug, Clone)]
pub struct CanonicalColumn {
    pub name: String,
    pub dtype: DataType,
    pub role: ColumnRole,
}

impl CanonicalColumn {
    fn new(name: &str, dtype: DataType, role: ColumnRole) -> Self {
        Self {
            name: name.to_string(),
            dtype,
            role,
        }
    }
}

/// A latitude/longitude column pair validated and indexed together
#[derive(Debug, Clone)]
pub struct CoordinatePair {
    /// Prefix for derived columns (`pickup`, `dropoff`)
    pub prefix: String,
    pub latitude: String,
    pub longitude: String,
}

impl CoordinatePair {
    /// Name of the boolean validity flag column derived for this pair
    pub fn flag_name(&self) -> String {
        format!("{}{}", self.prefix, VALIDITY_FLAG_SUFFIX)
    }
}

/// A timestamp column and the prefix used for its derived time features
#[derive(Debug, Clone)]
pub struct TimestampColumn {
    pub prefix: String,
    pub name: String,
}

/// The canonical column-name/type contract for trip partitions
#[derive(Debug, Clone)]
pub struct CanonicalSchema {
    columns: Vec<CanonicalColumn>,
    coordinate_pairs: Vec<CoordinatePair>,
    timestamp_columns: Vec<TimestampColumn>,
    /// Normalized physical-name key -> canonical column name
    lookup: HashMap<String, String>,
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self::nyc_yellow()
    }
}

impl CanonicalSchema {
    /// Build a schema from columns, coordinate pairs, timestamp columns and
    /// extra physical-name aliases (alias -> canonical name)
    pub fn new(
        columns: Vec<CanonicalColumn>,
        coordinate_pairs: Vec<CoordinatePair>,
        timestamp_columns: Vec<TimestampColumn>,
        aliases: &[(&str, &str)],
    ) -> Self {
        let mut lookup = HashMap::new();

        // Every canonical name resolves to itself, and the normalized key
        // absorbs case and separator variants for free.
        for column in &columns {
            lookup.insert(normalize_key(&column.name), column.name.clone());
        }
        for (alias, canonical) in aliases {
            lookup.insert(normalize_key(alias), canonical.to_string());
        }

        Self {
            columns,
            coordinate_pairs,
            timestamp_columns,
            lookup,
        }
    }

    /// Canonical schema for NYC yellow taxi trip records (2015 layout)
    pub fn nyc_yellow() -> Self {
        use ColumnRole::*;

        let columns = vec![
            CanonicalColumn::new("vendor_id", DataType::Int32, Categorical),
            CanonicalColumn::new(PICKUP_DATETIME_COL, DataType::String, Timestamp),
            CanonicalColumn::new(DROPOFF_DATETIME_COL, DataType::String, Timestamp),
            CanonicalColumn::new("passenger_count", DataType::Int32, Measure),
            CanonicalColumn::new("trip_distance", DataType::Float64, Measure),
            CanonicalColumn::new(PICKUP_LONGITUDE_COL, DataType::Float64, Coordinate),
            CanonicalColumn::new(PICKUP_LATITUDE_COL, DataType::Float64, Coordinate),
            CanonicalColumn::new("ratecode_id", DataType::Int32, Categorical),
            CanonicalColumn::new("store_and_fwd_flag", DataType::String, Categorical),
            CanonicalColumn::new(DROPOFF_LONGITUDE_COL, DataType::Float64, Coordinate),
            CanonicalColumn::new(DROPOFF_LATITUDE_COL, DataType::Float64, Coordinate),
            CanonicalColumn::new("payment_type", DataType::Int32, Categorical),
            CanonicalColumn::new("fare_amount", DataType::Float64, Measure),
            CanonicalColumn::new("extra", DataType::Float64, Measure),
            CanonicalColumn::new("mta_tax", DataType::Float64, Measure),
            CanonicalColumn::new("tip_amount", DataType::Float64, Measure),
            CanonicalColumn::new("tolls_amount", DataType::Float64, Measure),
            CanonicalColumn::new("improvement_surcharge", DataType::Float64, Measure),
            CanonicalColumn::new("total_amount", DataType::Float64, Measure),
        ];

        let coordinate_pairs = vec![
            CoordinatePair {
                prefix: "pickup".to_string(),
                latitude: PICKUP_LATITUDE_COL.to_string(),
                longitude: PICKUP_LONGITUDE_COL.to_string(),
            },
            CoordinatePair {
                prefix: "dropoff".to_string(),
                latitude: DROPOFF_LATITUDE_COL.to_string(),
                longitude: DROPOFF_LONGITUDE_COL.to_string(),
            },
        ];

        let timestamp_columns = vec![
            TimestampColumn {
                prefix: "pickup".to_string(),
                name: PICKUP_DATETIME_COL.to_string(),
            },
            TimestampColumn {
                prefix: "dropoff".to_string(),
                name: DROPOFF_DATETIME_COL.to_string(),
            },
        ];

        // Names that differ by more than case or separators
        let aliases = [
            ("pickup_datetime", PICKUP_DATETIME_COL),
            ("dropoff_datetime", DROPOFF_DATETIME_COL),
            ("start_lat", PICKUP_LATITUDE_COL),
            ("start_lon", PICKUP_LONGITUDE_COL),
            ("end_lat", DROPOFF_LATITUDE_COL),
            ("end_lon", DROPOFF_LONGITUDE_COL),
        ];

        Self::new(columns, coordinate_pairs, timestamp_columns, &aliases)
    }

    /// Resolve a physical column name to its canonical name, if known
    pub fn resolve(&self, physical: &str) -> Option<&str> {
        self.lookup.get(&normalize_key(physical)).map(String::as_str)
    }

    /// Iterate canonical columns in schema order
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalColumn> {
        self.columns.iter()
    }

    /// Canonical column names in schema order
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn coordinate_pairs(&self) -> &[CoordinatePair] {
        &self.coordinate_pairs
    }

    pub fn timestamp_columns(&self) -> &[TimestampColumn] {
        &self.timestamp_columns
    }
}

/// Reduce a physical column name to a comparison key: ASCII lowercase with
/// separators stripped, so `RateCodeID`, `RatecodeID` and `ratecode_id` all
/// produce `ratecodeid`.
fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
