//! Batch workflow
//!
//! Strictly linear: scan → build → normalize → cluster → export. No stage keeps
//! state beyond its own invocation.

pub mod pipeline;

pub use pipeline::{ClusteredDataset, Pipeline, PipelineConfig, PipelineOutput};
