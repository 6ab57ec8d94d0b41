// src/process/utils.rs
use anyhow::{anyhow, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, StringArray, UInt32Array},
    compute::take,
    record_batch::RecordBatch,
};
use std::cmp::Ordering;

/// Borrow a column as UTF-8 strings.
pub fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("column `{}` not found", name))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("column `{}` is not a string column", name))
}

/// Borrow a column as nullable f64. Only valid after numeric coercion has
/// rebuilt the column.
pub fn f64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("column `{}` not found", name))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| anyhow!("column `{}` has not been coerced to numeric", name))
}

pub fn str_value<'a>(arr: &'a StringArray, i: usize) -> Option<&'a str> {
    if arr.is_null(i) {
        None
    } else {
        Some(arr.value(i))
    }
}

pub fn f64_value(arr: &Float64Array, i: usize) -> Option<f64> {
    if arr.is_null(i) {
        None
    } else {
        Some(arr.value(i))
    }
}

/// Reassemble a batch from a row-index permutation (or subset).
pub fn take_batch(batch: &RecordBatch, indices: &[u32]) -> Result<RecordBatch> {
    let indices = UInt32Array::from(indices.to_vec());
    let columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| take(col.as_ref(), &indices, None).map_err(Into::into))
        .collect::<Result<_>>()?;
    RecordBatch::try_new(batch.schema(), columns).map_err(Into::into)
}

/// Descending order on search volume with nulls last. Callers rely on a
/// stable sort so that equal volumes keep their prior relative order.
pub fn cmp_volume_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Render a ranking position for display. Positions are integral in practice,
/// so integral floats drop the fractional part entirely.
pub fn format_position(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}
