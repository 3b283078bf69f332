//! Spatial indexing stage.
//!
//! Maps each coordinate pair to a hierarchical H3 cell identifier at every
//! configured resolution level. The mapping is a total, deterministic
//! function over the floating-point domain: bad input (missing, NaN,
//! out-of-range) produces a null cell, never an error. This is the largest
//! per-row cost in the pipeline, so the kernel is a plain function over
//! chunked arrays with no cross-row state, leaving partitions free to run
//! row-parallel on any worker.

use crate::constants::CELL_COLUMN_INFIX;
use crate::error::Result;
use crate::schema::CanonicalSchema;
use h3o::{LatLng, Resolution};
use polars::prelude::*;

/// Row kernel: deterministic (lat, lon, resolution) -> H3 cell id string.
/// Returns `None` for non-finite or out-of-domain coordinates.
pub fn cell_id(latitude: f64, longitude: f64, resolution: Resolution) -> Option<String> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    let coord = LatLng::new(latitude, longitude).ok()?;
    Some(coord.to_cell(resolution).to_string())
}

/// Name of the cell-id column for a coordinate-pair prefix and resolution
pub fn cell_column_name(prefix: &str, resolution: Resolution) -> String {
    format!("{}{}{}", prefix, CELL_COLUMN_INFIX, u8::from(resolution))
}

/// Attach one cell-id column per coordinate pair per resolution level.
/// Each resolution is computed independently; no column assumes another
/// resolution's column exists.
pub fn attach_cell_columns(
    df: DataFrame,
    schema: &CanonicalSchema,
    resolutions: &[Resolution],
) -> Result<DataFrame> {
    let mut cells: Vec<Series> =
        Vec::with_capacity(schema.coordinate_pairs().len() * resolutions.len());

    for pair in schema.coordinate_pairs() {
        let latitudes = df.column(&pair.latitude)?.as_materialized_series().clone();
        let longitudes = df.column(&pair.longitude)?.as_materialized_series().clone();

        for &resolution in resolutions {
            let ids: Vec<Option<String>> = latitudes
                .f64()?
                .into_iter()
                .zip(longitudes.f64()?.into_iter())
                .map(|(lat, lon)| match (lat, lon) {
                    (Some(lat), Some(lon)) => cell_id(lat, lon, resolution),
                    _ => None,
                })
                .collect();

            cells.push(Series::new(
                cell_column_name(&pair.prefix, resolution).into(),
                ids,
            ));
        }
    }

    let mut df = df;
    for series in cells {
        df.with_column(series)?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_is_deterministic() {
        let first = cell_id(40.7484, -73.9857, Resolution::Nine).unwrap();
        for _ in 0..10 {
            assert_eq!(cell_id(40.7484, -73.9857, Resolution::Nine).unwrap(), first);
        }
    }

    #[test]
    fn test_bad_input_yields_none_never_panics() {
        // Latitude 91 is outside any valid geographic range: missing at
        // every resolution.
        for res in [Resolution::Zero, Resolution::Seven, Resolution::Fifteen] {
            assert_eq!(cell_id(91.0, -74.0, res), None);
        }
        assert_eq!(cell_id(40.7, -181.0, Resolution::Nine), None);
        assert_eq!(cell_id(f64::NAN, -74.0, Resolution::Nine), None);
        assert_eq!(cell_id(40.7, f64::INFINITY, Resolution::Nine), None);
    }

    #[test]
    fn test_domain_edges_are_valid() {
        assert!(cell_id(90.0, 180.0, Resolution::Five).is_some());
        assert!(cell_id(-90.0, -180.0, Resolution::Five).is_some());
    }

    #[test]
    fn test_resolutions_are_independent() {
        let fine = cell_id(40.7484, -73.9857, Resolution::Nine).unwrap();
        let coarse = cell_id(40.7484, -73.9857, Resolution::Seven).unwrap();
        assert_ne!(fine, coarse);
    }

    #[test]
    fn test_nearby_points_share_a_coarse_cell() {
        let a = cell_id(40.7484, -73.9857, Resolution::Five).unwrap();
        let b = cell_id(40.7490, -73.9860, Resolution::Five).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_attach_produces_one_column_per_pair_per_resolution() {
        let schema = CanonicalSchema::nyc_yellow();
        let df = DataFrame::new(vec![
            Series::new("pickup_latitude".into(), vec![Some(40.7), Some(91.0), None]).into(),
            Series::new(
                "pickup_longitude".into(),
                vec![Some(-74.0), Some(-74.0), Some(-74.0)],
            )
            .into(),
            Series::new("dropoff_latitude".into(), vec![Some(40.8); 3]).into(),
            Series::new("dropoff_longitude".into(), vec![Some(-73.9); 3]).into(),
        ])
        .unwrap();

        let resolutions = [Resolution::Seven, Resolution::Nine];
        let df = attach_cell_columns(df, &schema, &resolutions).unwrap();

        for prefix in ["pickup", "dropoff"] {
            for res in resolutions {
                assert!(df.column(&cell_column_name(prefix, res)).is_ok());
            }
        }

        let cells: Vec<Option<String>> = df
            .column("pickup_h3_r9")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(String::from))
            .collect();

        assert!(cells[0].is_some());
        // Out-of-range and missing coordinates both degrade to null
        assert_eq!(cells[1], None);
        assert_eq!(cells[2], None);
    }
}
