//! Pipeline-fatal errors
//!
//! Per-field and per-file failures are absorbed by the scanner. Everything
//! here aborts the run.

use crate::services::{ClusterError, ExportError, NormalizeError, ScanError};
use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration rejected before the run started
    #[error("Configuration error: {0}")]
    Config(#[from] songsim_common::Error),

    /// Source root missing or not a directory
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// No source documents found under the root
    #[error("No source documents found under {0}")]
    NoSourceFiles(PathBuf),

    /// Source documents found but none produced a record
    #[error("None of the {files} source documents produced a usable record")]
    NoUsableRecords { files: usize },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Run summary could not be written
    #[error("Failed to write run summary: {0}")]
    Summary(#[source] std::io::Error),
}
