// src/process/dedup.rs
use anyhow::Result;
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;
use tracing::info;

use crate::process::utils::{str_col, str_value, take_batch};
use crate::schema::{DOMAIN, KEYWORD};

/// Sort by `(Domain asc, Keyword asc)` and keep the first record per
/// distinct keyword.
///
/// The sort is stable with nulls ordered first, so among duplicate keywords
/// the survivor is the one with the lexicographically smallest domain, ties
/// broken by original input position. The result keeps the sorted order.
/// Null keywords form a single group of their own and keep one row.
pub fn dedup_by_keyword(batch: &RecordBatch) -> Result<RecordBatch> {
    let domains = str_col(batch, DOMAIN)?;
    let keywords = str_col(batch, KEYWORD)?;

    let mut order: Vec<u32> = (0..batch.num_rows() as u32).collect();
    order.sort_by(|&a, &b| {
        let ka = (
            str_value(domains, a as usize),
            str_value(keywords, a as usize),
        );
        let kb = (
            str_value(domains, b as usize),
            str_value(keywords, b as usize),
        );
        ka.cmp(&kb)
    });

    let mut seen: HashSet<Option<&str>> = HashSet::with_capacity(batch.num_rows());
    let mut kept: Vec<u32> = Vec::with_capacity(batch.num_rows());
    for &i in &order {
        if seen.insert(str_value(keywords, i as usize)) {
            kept.push(i);
        }
    }

    let out = take_batch(batch, &kept)?;
    info!(
        rows_in = batch.num_rows(),
        rows_out = out.num_rows(),
        "removed duplicate keywords"
    );
    Ok(out)
}
