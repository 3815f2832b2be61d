//! Source extractors
//!
//! - **track_document** - opens a per-track source document and reads typed cells
//! - **track_extractor** - turns a document into a [`TrackRecord`] with per-field
//!   fallback substitution
//!
//! [`TrackRecord`]: songsim_common::TrackRecord

pub mod track_document;
pub mod track_extractor;

pub use track_document::{ExtractError, FieldError, FieldPath, TrackDocument};
pub use track_extractor::{Extraction, TrackExtractor, TrackField};
