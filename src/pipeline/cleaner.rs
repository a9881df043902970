//! Record cleaning: empty-row removal and mode imputation
//!
//! A cell counts as missing when it is null, or NaN in a float column.
//! Fill values are computed per column from the data as it stands after
//! empty rows are dropped and before any fill is applied, so the result
//! never depends on column order.

use std::collections::HashMap;

use log::{debug, info, warn};
use polars::prelude::*;

/// What cleaning changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_dropped: usize,
    /// (column, number of cells filled) for every column that received fills
    pub filled: Vec<(String, usize)>,
    /// Columns left untouched because no value was ever observed
    pub unfillable: Vec<String>,
}

impl CleaningSummary {
    pub fn total_filled(&self) -> usize {
        self.filled.iter().map(|(_, n)| n).sum()
    }
}

/// Clean a record set: drop fully-empty rows, then mode-impute each column.
pub fn clean(df: &DataFrame) -> PolarsResult<DataFrame> {
    clean_with_summary(df).map(|(cleaned, _)| cleaned)
}

/// Same as [`clean`], also reporting what was dropped and filled.
pub fn clean_with_summary(df: &DataFrame) -> PolarsResult<(DataFrame, CleaningSummary)> {
    let mut summary = CleaningSummary {
        rows_before: df.height(),
        ..Default::default()
    };

    let trimmed = drop_empty_rows(df)?;
    summary.rows_dropped = df.height() - trimmed.height();

    let mut columns: Vec<Column> = Vec::with_capacity(trimmed.width());
    for column in trimmed.get_columns() {
        let missing = missing_mask(column)?;
        let missing_count = missing.iter().filter(|m| **m).count();

        if missing_count == 0 {
            columns.push(column.clone());
            continue;
        }

        match fill_with_mode(column, &missing)? {
            Some(filled) => {
                debug!("Filled {} missing value(s) in '{}'", missing_count, column.name());
                summary.filled.push((column.name().to_string(), missing_count));
                columns.push(filled);
            }
            None => {
                summary.unfillable.push(column.name().to_string());
                columns.push(column.clone());
            }
        }
    }

    let cleaned = DataFrame::new(columns)?;

    info!(
        "Cleaned records: {} row(s) dropped, {} cell(s) filled across {} column(s)",
        summary.rows_dropped,
        summary.total_filled(),
        summary.filled.len()
    );

    Ok((cleaned, summary))
}

/// Drop rows in which every field is missing
pub fn drop_empty_rows(df: &DataFrame) -> PolarsResult<DataFrame> {
    if df.width() == 0 || df.height() == 0 {
        return Ok(df.clone());
    }

    let mut keep = vec![false; df.height()];
    for column in df.get_columns() {
        for (row, missing) in missing_mask(column)?.into_iter().enumerate() {
            if !missing {
                keep[row] = true;
            }
        }
    }

    if keep.iter().all(|k| *k) {
        return Ok(df.clone());
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    df.filter(&mask)
}

/// Per-row missing flags for a column: null, or NaN for float columns
pub fn missing_mask(column: &Column) -> PolarsResult<Vec<bool>> {
    let series = column.as_materialized_series();

    if series.dtype().is_float() {
        let floats = series.cast(&DataType::Float64)?;
        return Ok(floats
            .f64()?
            .into_iter()
            .map(|v| v.map_or(true, |x| x.is_nan()))
            .collect());
    }

    Ok(series
        .is_null()
        .into_iter()
        .map(|v| v.unwrap_or(true))
        .collect())
}

/// Replace missing cells with the column's most frequent observed value.
/// Returns `None` when the column has no observed value to take a mode from.
fn fill_with_mode(column: &Column, missing: &[bool]) -> PolarsResult<Option<Column>> {
    let name = column.name().clone();
    let dtype = column.dtype().clone();

    if dtype.is_primitive_numeric() {
        let floats = column.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = floats
            .f64()?
            .into_iter()
            .zip(missing)
            .map(|(v, &m)| if m { None } else { v })
            .collect();

        let Some(mode) = numeric_mode(&values) else {
            return Ok(None);
        };
        let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(mode)).collect();
        return Column::new(name, filled).cast(&dtype).map(Some);
    }

    match dtype {
        DataType::String => {
            let values: Vec<Option<&str>> = column.str()?.into_iter().collect();
            let Some(mode) = string_mode(&values) else {
                return Ok(None);
            };
            let filled: Vec<&str> = values.into_iter().map(|v| v.unwrap_or(mode)).collect();
            Ok(Some(Column::new(name, filled)))
        }
        DataType::Boolean => {
            let values: Vec<Option<bool>> = column.bool()?.into_iter().collect();
            let trues = values.iter().filter(|v| **v == Some(true)).count();
            let falses = values.iter().filter(|v| **v == Some(false)).count();
            if trues + falses == 0 {
                return Ok(None);
            }
            // false sorts first, so it wins ties
            let mode = trues > falses;
            let filled: Vec<bool> = values.into_iter().map(|v| v.unwrap_or(mode)).collect();
            Ok(Some(Column::new(name, filled)))
        }
        other => {
            warn!(
                "Column '{}' has unsupported type {:?} for mode imputation; left unfilled",
                name, other
            );
            Ok(None)
        }
    }
}

/// Most frequent value; ties resolve to the smallest value
fn numeric_mode(values: &[Option<f64>]) -> Option<f64> {
    let mut counts: HashMap<u64, (f64, usize)> = HashMap::new();
    for v in values.iter().flatten() {
        // fold -0.0 into 0.0 so both count as one value
        let v = if *v == 0.0 { 0.0 } else { *v };
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }

    counts
        .into_values()
        .max_by(|(a, count_a), (b, count_b)| {
            count_a
                .cmp(count_b)
                .then_with(|| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal))
        })
        .map(|(v, _)| v)
}

/// Most frequent string; ties resolve to the lexicographically smallest
fn string_mode<'a>(values: &[Option<&'a str>]) -> Option<&'a str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(a, count_a), (b, count_b)| count_a.cmp(count_b).then_with(|| b.cmp(a)))
        .map(|(v, _)| v)
}
