//! Test Helper Utilities
//!
//! Shared utilities for testing songsim-pipeline

#![allow(dead_code)]

pub mod log_capture;
pub mod track_generator;

pub use log_capture::{capture_logs, LogCapture};
pub use track_generator::{generate_track_tree, write_raw, write_track, TrackFixture};
