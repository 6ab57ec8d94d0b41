//! Merge keyword-ranking exports, drop duplicate and outranked keywords, and
//! build a per-competitor-URL content-opportunity report.
//!
//! The crate is a single batch pipeline over in-memory Arrow batches; see
//! [`process::run`] for the stage ordering and [`ingest`]/[`emit`] for the
//! CSV edges.

pub mod emit;
pub mod error;
pub mod ingest;
pub mod process;
pub mod schema;
