// src/ingest/mod.rs
use anyhow::Result;
use csv::ReaderBuilder;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::{debug, info};

use crate::error::PipelineError;

/// One keyword-ranking export, parsed but untyped.
#[derive(Debug)]
pub struct RawTable {
    /// Where the table came from, used in error and log messages.
    pub source: String,
    /// Column names, from the header row of the specific CSV file.
    pub headers: Vec<String>,
    /// Each data row, as a Vec of Strings (one per field). Rows may be
    /// shorter than the header; the merge step fills the tail with nulls.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Parse one CSV export into a [`RawTable`].
///
/// Any malformed record is a hard stop that names the offending input: the
/// caller is expected to abort the whole run rather than continue with a
/// partial dataset. Rows carrying more fields than the header are rejected
/// for the same reason; short rows are allowed and padded with nulls later.
pub fn read_table<R: Read>(source: &str, reader: R) -> Result<RawTable> {
    let parse_err = |reason: String| PipelineError::Parse {
        source_name: source.to_string(),
        reason,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| parse_err(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(parse_err("no header row".to_string()).into());
    }

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| parse_err(format!("record {}: {}", idx + 1, e)))?;
        if record.len() > headers.len() {
            return Err(parse_err(format!(
                "record {} has {} fields but the header has {}",
                idx + 1,
                record.len(),
                headers.len()
            ))
            .into());
        }
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    debug!(source, rows = rows.len(), cols = headers.len(), "parsed table");
    Ok(RawTable {
        source: source.to_string(),
        headers,
        rows,
    })
}

/// Read one CSV file from disk.
pub fn read_table_file<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let file = File::open(path).map_err(|e| PipelineError::Parse {
        source_name: name.clone(),
        reason: e.to_string(),
    })?;
    read_table(&name, BufReader::new(file))
}

/// Read every input file, in the given order. The first failure aborts; no
/// partial set of tables is ever returned.
pub fn read_table_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RawTable>> {
    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        let table = read_table_file(path)?;
        info!(
            source = %table.source,
            rows = table.row_count(),
            "loaded input"
        );
        tables.push(table);
    }
    Ok(tables)
}
