//! Schema normalization stage.
//!
//! Reconciles a partition's physical columns with the canonical trip schema
//! before anything else touches the data. Normalization is eager and total:
//! unknown columns are dropped with a log line, missing canonical columns
//! are added all-null, and values that cannot be coerced to the canonical
//! type become null rather than failing the partition. The orchestrator's
//! schema check afterwards is a post-condition, not the first line of
//! defense.

use crate::error::Result;
use crate::schema::CanonicalSchema;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Return a partition whose columns exactly match the canonical schema's
/// names, types and order. Idempotent: an already-canonical partition comes
/// back unchanged.
pub fn normalize_partition(
    df: &DataFrame,
    schema: &CanonicalSchema,
    partition_id: &str,
) -> Result<DataFrame> {
    let height = df.height();

    // Canonical name -> physical column holding it. First match wins when a
    // partition carries duplicate variants of the same logical field.
    let mut mapping: HashMap<&str, &str> = HashMap::new();
    for physical in df.get_column_names_str() {
        match schema.resolve(physical) {
            Some(canonical) => {
                if mapping.contains_key(canonical) {
                    warn!(
                        "Partition '{}': duplicate source column '{}' for '{}', keeping first",
                        partition_id, physical, canonical
                    );
                } else {
                    mapping.insert(canonical, physical);
                }
            }
            None => {
                warn!(
                    "Partition '{}': dropping column '{}' not in canonical schema",
                    partition_id, physical
                );
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(schema.len());
    for canonical in schema.iter() {
        let series = match mapping.get(canonical.name.as_str()) {
            Some(physical) => {
                let source = df.column(physical)?.as_materialized_series();
                let coerced = if source.dtype() == &canonical.dtype {
                    source.clone()
                } else {
                    // Non-strict cast: uncoercible values become null
                    source.cast(&canonical.dtype)?
                };
                coerced.with_name(canonical.name.as_str().into())
            }
            None => {
                debug!(
                    "Partition '{}': adding missing canonical column '{}' as all-null",
                    partition_id, canonical.name
                );
                Series::full_null(canonical.name.as_str().into(), height, &canonical.dtype)
            }
        };
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}
