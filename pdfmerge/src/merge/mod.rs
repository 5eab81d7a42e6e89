//! Merge orchestration.
//!
//! The [`MergeOrchestrator`] turns a snapshot of entries into one serialised
//! output document, strictly in order and one entry at a time. It never
//! produces a partial document: the first unrecoverable failure aborts the
//! whole run.

pub mod orchestrator;

pub use orchestrator::{MergeOrchestrator, MergeOutput, MergeStatistics};
