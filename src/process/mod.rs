// src/process/mod.rs
//
// The pipeline itself. Every stage is a pure function from batch to batch;
// `run` wires them together in order:
//
//   merge -> required-column gate -> dedup -> rank/filter -> aggregate
//
// The caller hands the result to `emit` (or renders it some other way).

pub mod aggregate;
pub mod dedup;
pub mod merge;
pub mod rank;
pub mod utils;

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use std::time::Instant;
use tracing::info;

use crate::ingest::RawTable;
use crate::schema;

/// Run the whole pipeline over the parsed inputs and return the final
/// content-opportunity report, one record per competitor URL.
pub fn run(tables: &[RawTable]) -> Result<RecordBatch> {
    let start = Instant::now();

    let merged = merge::merge_tables(tables)?;
    schema::check_required(&merged)?;
    let deduped = dedup::dedup_by_keyword(&merged)?;
    let filtered = rank::rank_and_filter(&deduped)?;
    let report = aggregate::aggregate_by_competitor(&filtered)?;

    info!(
        records = report.num_rows(),
        elapsed = ?start.elapsed(),
        "pipeline complete"
    );
    Ok(report)
}
