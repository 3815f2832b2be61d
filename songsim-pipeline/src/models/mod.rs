//! Data models for songsim-pipeline
//!
//! - Tagged field/file extraction outcomes
//! - Run summary report

pub mod outcome;
pub mod run_summary;

pub use outcome::{FallbackReason, FieldOutcome, FileOutcome, OutcomeTally, SkipReason};
pub use run_summary::{BuildInfo, ClusterSummary, RunSummary};
