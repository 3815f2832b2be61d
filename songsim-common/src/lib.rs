//! # songsim Common Library
//!
//! Shared code for the songsim crates:
//! - Track, artist and export row types
//! - Common error type
//! - Bootstrap configuration loading

pub mod config;
pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{ArtistRecord, SongRow, TrackDumpRow, TrackRecord, FEATURE_COUNT, FEATURE_NAMES};
