//! Coordinate validity stage.
//!
//! Classifies each coordinate pair against the configured bounding region
//! and annotates the partition with one boolean flag column per pair. The
//! check is pure and row-local: no partition ever needs another partition's
//! data, which is what makes this stage safe to run on any number of
//! workers.

use crate::config::BoundingBox;
use crate::error::Result;
use crate::schema::CanonicalSchema;
use polars::prelude::*;

/// Row kernel: boundary-inclusive bounding-box check. Missing coordinates
/// are always invalid; this never fails.
pub fn coordinate_in_bounds(
    latitude: Option<f64>,
    longitude: Option<f64>,
    bbox: &BoundingBox,
) -> bool {
    matches!(
        (latitude, longitude),
        (Some(lat), Some(lon)) if bbox.contains(lat, lon)
    )
}

/// Annotate the partition with a validity flag column per coordinate pair.
/// Source coordinate columns are never mutated.
pub fn annotate_validity(
    df: DataFrame,
    schema: &CanonicalSchema,
    bbox: &BoundingBox,
) -> Result<DataFrame> {
    let mut flags: Vec<Series> = Vec::with_capacity(schema.coordinate_pairs().len());

    for pair in schema.coordinate_pairs() {
        let latitudes = df.column(&pair.latitude)?.as_materialized_series().clone();
        let longitudes = df.column(&pair.longitude)?.as_materialized_series().clone();

        let values: Vec<bool> = latitudes
            .f64()?
            .into_iter()
            .zip(longitudes.f64()?.into_iter())
            .map(|(lat, lon)| coordinate_in_bounds(lat, lon, bbox))
            .collect();

        flags.push(Series::new(pair.flag_name().into(), values));
    }

    let mut df = df;
    for flag in flags {
        df.with_column(flag)?;
    }
    Ok(df)
}

/// Return the sub-partition of rows whose flag column is true, preserving
/// the original row order.
pub fn filter_valid(df: &DataFrame, flag_column: &str) -> Result<DataFrame> {
    let mask = df
        .column(flag_column)?
        .as_materialized_series()
        .bool()?
        .clone();
    Ok(df.filter(&mask)?)
}
