use anyhow::{bail, Result};
use clap::Parser;
use gapscan::{emit, ingest, process};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Merge keyword-ranking exports and build a content-opportunity report.
#[derive(Parser)]
#[command(name = "gapscan", version)]
struct Args {
    /// Input CSV files; glob patterns are allowed.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Where to write the final report.
    #[arg(short, long, default_value = "final_table.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    // ─── 2) expand input patterns ────────────────────────────────────
    let paths = expand_inputs(&args.inputs)?;
    info!(files = paths.len(), "starting run");

    // ─── 3) ingest, process, emit ────────────────────────────────────
    let tables = ingest::read_table_files(&paths)?;
    let report = process::run(&tables)?;
    emit::write_csv_file(&report, &args.output)?;

    Ok(())
}

/// Expand each argument as a glob pattern, in argument order with matches in
/// lexical order. A literal path that exists is taken as-is; a pattern that
/// matches nothing is an error rather than a silently smaller dataset.
fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let candidate = PathBuf::from(pattern);
        if candidate.is_file() {
            paths.push(candidate);
            continue;
        }

        let before = paths.len();
        for entry in glob::glob(pattern)? {
            paths.push(entry?);
        }
        if paths.len() == before {
            bail!("input pattern `{}` matched no files", pattern);
        }
    }
    Ok(paths)
}
