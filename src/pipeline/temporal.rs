//! Temporal feature stage.
//!
//! Derives hour-of-day, day-of-week (Monday = 1), month and calendar date
//! from each timestamp column in the canonical schema. Parsing is
//! non-strict and row-local: an unparsable or missing timestamp propagates
//! null to every derived field for that row, never a default such as zero
//! and never an error.

use crate::constants::TIMESTAMP_FORMAT;
use crate::error::Result;
use crate::schema::CanonicalSchema;
use polars::prelude::*;

/// Derived time-feature column names for a timestamp prefix
pub fn time_column_names(prefix: &str) -> [String; 4] {
    [
        format!("{}_hour", prefix),
        format!("{}_day_of_week", prefix),
        format!("{}_month", prefix),
        format!("{}_date", prefix),
    ]
}

/// Attach the derived time-feature columns for every timestamp column
pub fn attach_time_columns(df: DataFrame, schema: &CanonicalSchema) -> Result<DataFrame> {
    if schema.timestamp_columns().is_empty() {
        return Ok(df);
    }

    let mut exprs: Vec<Expr> = Vec::with_capacity(schema.timestamp_columns().len() * 4);
    for ts in schema.timestamp_columns() {
        let parsed = col(ts.name.as_str()).str().to_datetime(
            Some(TimeUnit::Microseconds),
            None,
            StrptimeOptions {
                format: Some(TIMESTAMP_FORMAT.into()),
                strict: false,
                ..Default::default()
            },
            lit("raise"),
        );

        let [hour, day_of_week, month, date] = time_column_names(&ts.prefix);
        exprs.push(parsed.clone().dt().hour().cast(DataType::Int8).alias(hour));
        exprs.push(
            parsed
                .clone()
                .dt()
                .weekday()
                .cast(DataType::Int8)
                .alias(day_of_week),
        );
        exprs.push(parsed.clone().dt().month().cast(DataType::Int8).alias(month));
        exprs.push(parsed.cast(DataType::Date).alias(date));
    }

    Ok(df.lazy().with_columns(exprs).collect()?)
}
