// src/process/merge.rs
use anyhow::Result;
use arrow::{
    array::{ArrayRef, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::info;

use crate::error::PipelineError;
use crate::ingest::RawTable;

/// Concatenate raw tables into one all-string batch.
///
/// Row order is the original order within each input, inputs in the order
/// given. The column set is the union of every input's headers, in first-seen
/// order. A row that lacks a column (the column came from another file, or
/// the row is shorter than its own header) gets a null there; empty fields
/// also become null so that "no value" reads the same regardless of which
/// file it came from.
pub fn merge_tables(tables: &[RawTable]) -> Result<RecordBatch> {
    if tables.is_empty() {
        return Err(PipelineError::NoInput.into());
    }

    // Union of headers, first-seen order across inputs.
    let mut columns: Vec<String> = Vec::new();
    for table in tables {
        for header in &table.headers {
            if !columns.iter().any(|c| c == header) {
                columns.push(header.clone());
            }
        }
    }

    let total_rows: usize = tables.iter().map(RawTable::row_count).sum();
    let mut builders: Vec<StringBuilder> = columns
        .iter()
        .map(|_| StringBuilder::with_capacity(total_rows, 0))
        .collect();

    for table in tables {
        // Map each output column to its field index in this table, if any.
        let field_of: Vec<Option<usize>> = columns
            .iter()
            .map(|c| table.headers.iter().position(|h| h == c))
            .collect();

        for row in &table.rows {
            for (builder, src) in builders.iter_mut().zip(&field_of) {
                match src.and_then(|i| row.get(i)) {
                    Some(value) if !value.is_empty() => builder.append_value(value),
                    _ => builder.append_null(),
                }
            }
        }
    }

    let fields: Vec<Field> = columns
        .iter()
        .map(|c| Field::new(c, DataType::Utf8, true))
        .collect();
    let arrays: Vec<ArrayRef> = builders
        .into_iter()
        .map(|mut b| Arc::new(b.finish()) as ArrayRef)
        .collect();

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
    info!(
        inputs = tables.len(),
        rows = batch.num_rows(),
        cols = batch.num_columns(),
        "merged input tables"
    );
    Ok(batch)
}
