//! Record loading from the backing store

use log::info;
use polars::prelude::*;
use serde_json::{Map, Number, Value};

use super::schema::{RecordCollection, STORAGE_ID_COLUMN};
use crate::error::{PipelineError, Result};
use crate::store::RecordStore;

/// Load every longitudinal record, without the storage-internal `_id` field
pub fn load_records(store: &dyn RecordStore) -> Result<DataFrame> {
    let mut df = store.load_collection(RecordCollection::Longitudinal)?;

    if df.get_column_index(STORAGE_ID_COLUMN).is_some() {
        df = df.drop(STORAGE_ID_COLUMN).map_err(PipelineError::storage)?;
    }

    let (rows, cols) = df.shape();
    info!("Loaded {} record(s) with {} column(s)", rows, cols);

    Ok(df)
}

/// Longitudinal records as JSON row objects, NaN and infinities as null
pub fn load_records_json(store: &dyn RecordStore) -> Result<Vec<Map<String, Value>>> {
    let df = load_records(store)?;
    records_to_json(&df).map_err(PipelineError::storage)
}

/// Render a frame as one JSON object per row
pub fn records_to_json(df: &DataFrame) -> PolarsResult<Vec<Map<String, Value>>> {
    let columns = df.get_columns();
    let mut rows = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let mut row = Map::new();
        for column in columns {
            row.insert(column.name().to_string(), any_value_to_json(column.get(i)?));
        }
        rows.push(row);
    }

    Ok(rows)
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        other => Value::String(other.to_string()),
    }
}
