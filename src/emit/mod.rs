// src/emit/mod.rs
use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use std::{fs::File, io::Write, path::Path};
use tracing::info;

/// Serialize the report as UTF-8 CSV: header row, no index column, nulls as
/// empty cells.
pub fn write_csv<W: Write>(batch: &RecordBatch, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().with_header(true).build(writer);
    writer.write(batch).context("writing CSV output")?;
    Ok(())
}

/// Write the report to a file. The file is only created once the pipeline
/// has already produced a final batch, so a failed run leaves no partial
/// output behind.
pub fn write_csv_file<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("creating output file {}", path.display()))?;
    write_csv(batch, file)?;
    info!(path = %path.display(), records = batch.num_rows(), "wrote report");
    Ok(())
}
