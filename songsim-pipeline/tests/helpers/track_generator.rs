//! Track Document Fixture Generator
//!
//! Writes synthetic per-track JSON documents shaped like the source dataset
//! (`group → table → field → [value]`).

use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Field values for one generated document; `None` omits the field
#[derive(Debug, Clone)]
pub struct TrackFixture {
    pub track_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub tempo: Option<f64>,
    pub key: Option<i64>,
    pub mode: Option<i64>,
    pub loudness: Option<f64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub year: Option<i64>,
}

impl Default for TrackFixture {
    fn default() -> Self {
        Self {
            track_id: None,
            title: Some("Untitled".to_string()),
            artist_id: Some("ARTEST00000000001".to_string()),
            artist_name: Some("Test Artist".to_string()),
            tempo: Some(120.0),
            key: Some(5),
            mode: Some(1),
            loudness: Some(-8.0),
            energy: Some(0.5),
            danceability: Some(0.5),
            year: Some(1999),
        }
    }
}

impl TrackFixture {
    /// Complete document with the given id, tempo and energy
    pub fn with_features(track_id: &str, tempo: f64, energy: f64) -> Self {
        Self {
            track_id: Some(track_id.to_string()),
            title: Some(format!("Song {}", track_id)),
            tempo: Some(tempo),
            energy: Some(energy),
            ..Default::default()
        }
    }

    pub fn artist(mut self, artist_id: &str, name: &str) -> Self {
        self.artist_id = Some(artist_id.to_string());
        self.artist_name = Some(name.to_string());
        self
    }

    pub fn to_json(&self) -> Value {
        let metadata = table([
            ("track_id", self.track_id.as_ref().map(|v| json!(v))),
            ("title", self.title.as_ref().map(|v| json!(v))),
            ("artist_id", self.artist_id.as_ref().map(|v| json!(v))),
            ("artist_name", self.artist_name.as_ref().map(|v| json!(v))),
        ]);
        let analysis = table([
            ("tempo", self.tempo.map(|v| json!(v))),
            ("key", self.key.map(|v| json!(v))),
            ("mode", self.mode.map(|v| json!(v))),
            ("loudness", self.loudness.map(|v| json!(v))),
            ("energy", self.energy.map(|v| json!(v))),
            ("danceability", self.danceability.map(|v| json!(v))),
        ]);
        let musicbrainz = table([("year", self.year.map(|v| json!(v)))]);

        json!({
            "metadata": {"songs": metadata},
            "analysis": {"songs": analysis},
            "musicbrainz": {"songs": musicbrainz},
        })
    }
}

fn table<const N: usize>(fields: [(&str, Option<Value>); N]) -> Value {
    let mut map = Map::new();
    for (name, value) in fields {
        if let Some(value) = value {
            map.insert(name.to_string(), json!([value]));
        }
    }
    Value::Object(map)
}

/// Write one document at `root/rel`, creating parent directories
pub fn write_track(root: &Path, rel: &str, fixture: &TrackFixture) -> PathBuf {
    write_raw(root, rel, &fixture.to_json().to_string())
}

/// Write arbitrary content at `root/rel`
pub fn write_raw(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Write one document per fixture under `A/<index>/`
///
/// File names sort in input order, so scan order matches `fixtures`.
pub fn generate_track_tree(root: &Path, fixtures: &[TrackFixture]) -> Vec<PathBuf> {
    fixtures
        .iter()
        .enumerate()
        .map(|(i, fixture)| {
            let stem = fixture
                .track_id
                .clone()
                .unwrap_or_else(|| format!("TRGEN{:04}", i));
            write_track(root, &format!("A/{:03}/{}.json", i, stem), fixture)
        })
        .collect()
}
