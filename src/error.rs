use thiserror::Error;

/// Failures that abort a pipeline run.
///
/// Numeric coercion failures are deliberately not represented here: an
/// unparseable value becomes a null and is reported through `tracing::warn!`,
/// so a run never aborts on bad cell contents.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to parse input `{source_name}`: {reason}")]
    Parse { source_name: String, reason: String },

    #[error("no input tables were provided")]
    NoInput,

    #[error("required columns missing from the merged data: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("the `Competitor Position` column is required to apply the position filter")]
    MissingCompetitorPosition,
}
