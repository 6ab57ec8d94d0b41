// src/schema/mod.rs
//
// Column contract for keyword-ranking exports. Names are matched
// case-sensitively against the headers the files actually carry.

use anyhow::Result;
use arrow::record_batch::RecordBatch;

use crate::error::PipelineError;

pub const KEYWORD: &str = "Keyword";
pub const SEARCH_VOLUME: &str = "Search Volume";
pub const KEYWORD_DIFFICULTY: &str = "Keyword Difficulty";
pub const DOMAIN: &str = "Domain";
pub const DOMAIN_POSITION: &str = "Domain Position";
pub const COMPETITOR_URL: &str = "Competitor URL";
pub const COMPETITOR_POSITION: &str = "Competitor Position";

/// Columns every merged dataset must carry before any processing happens.
/// `Competitor Position` is not part of this set: it is checked by a second,
/// narrower gate right before the position filter runs.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    KEYWORD,
    SEARCH_VOLUME,
    KEYWORD_DIFFICULTY,
    DOMAIN,
    DOMAIN_POSITION,
    COMPETITOR_URL,
];

/// First validation gate: every required column must be present on the merged
/// batch. Reports the full set of missing names at once.
pub fn check_required(batch: &RecordBatch) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| batch.column_by_name(name).is_none())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns { missing }.into())
    }
}

/// Second validation gate, specific to the ranking filter: the competitor
/// position must be present for the domain-vs-competitor comparison.
pub fn check_competitor_position(batch: &RecordBatch) -> Result<()> {
    if batch.column_by_name(COMPETITOR_POSITION).is_none() {
        return Err(PipelineError::MissingCompetitorPosition.into());
    }
    Ok(())
}
