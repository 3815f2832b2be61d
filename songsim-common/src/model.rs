//! Shared data model
//!
//! Records produced by the scanner and the flat rows handed to the bulk loader.
//! The row types define the column layout of the exported datasets; field
//! order is column order.

use serde::{Deserialize, Serialize};

/// Number of acoustic features per track
pub const FEATURE_COUNT: usize = 4;

/// Feature column names, in matrix column order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["tempo", "energy", "danceability", "loudness"];

/// One song's extracted identity and acoustic profile
///
/// Every field is populated, either from the source document or from the
/// fallback policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    /// Beats per minute
    pub tempo: f64,
    /// Pitch class, 0-11
    pub key: i32,
    /// 0 = minor, 1 = major
    pub mode: i32,
    pub release_year: i32,
    /// 0.0-1.0
    pub energy: f64,
    /// 0.0-1.0
    pub danceability: f64,
    /// dB, typically negative
    pub loudness: f64,
}

impl TrackRecord {
    /// Feature vector in matrix column order
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [self.tempo, self.energy, self.danceability, self.loudness]
    }

    /// Artist half of the record
    pub fn artist(&self) -> ArtistRecord {
        ArtistRecord {
            artist_id: self.artist_id.clone(),
            name: self.artist_name.clone(),
        }
    }
}

/// Row of the artist dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
}

/// Row of the song dataset, in the loader's column layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRow {
    pub song_id: String,
    pub title: String,
    pub key_signature: i32,
    pub mode: i32,
    pub release_year: i32,
    pub tempo: f64,
    pub energy: f64,
    pub danceability: f64,
    pub loudness: f64,
    pub cluster_id: usize,
    pub artist_id: String,
}

impl SongRow {
    /// Attach a cluster label to a record
    pub fn from_record(record: &TrackRecord, cluster_id: usize) -> Self {
        Self {
            song_id: record.song_id.clone(),
            title: record.title.clone(),
            key_signature: record.key,
            mode: record.mode,
            release_year: record.release_year,
            tempo: record.tempo,
            energy: record.energy,
            danceability: record.danceability,
            loudness: record.loudness,
            cluster_id,
            artist_id: record.artist_id.clone(),
        }
    }
}

/// Row of the full per-track dump (every record field plus the label)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDumpRow {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    pub tempo: f64,
    pub key: i32,
    pub mode: i32,
    pub year: i32,
    pub energy: f64,
    pub danceability: f64,
    pub loudness: f64,
    pub cluster_id: usize,
}

impl TrackDumpRow {
    pub fn from_record(record: &TrackRecord, cluster_id: usize) -> Self {
        Self {
            song_id: record.song_id.clone(),
            title: record.title.clone(),
            artist_id: record.artist_id.clone(),
            artist_name: record.artist_name.clone(),
            tempo: record.tempo,
            key: record.key,
            mode: record.mode,
            year: record.release_year,
            energy: record.energy,
            danceability: record.danceability,
            loudness: record.loudness,
            cluster_id,
        }
    }
}
