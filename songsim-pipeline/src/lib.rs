//! songsim-pipeline library interface
//!
//! Turns a tree of per-track acoustic documents into clustered CSV datasets.
//! Exposed as a library so integration tests can drive each stage directly.

pub mod error;
pub mod extractors;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{PipelineError, PipelineResult};
pub use crate::workflow::{ClusteredDataset, Pipeline, PipelineConfig, PipelineOutput};
