//! Dataset export
//!
//! Merges cluster labels onto records and writes the flat datasets consumed by
//! the bulk loader:
//! - `artists.csv` - distinct (artist_id, name), first-seen name wins
//! - `songs_processed.csv` - one row per record in the loader's column layout
//! - `songs.csv` - full per-track dump including artist_name
//!
//! All files are written to temporary siblings first and only then renamed
//! into place, so a successful run fully replaces the previous outputs and a
//! failed one leaves them as they were.

use crate::services::cluster_assigner::ClusterAssignment;
use serde::Serialize;
use songsim_common::{ArtistRecord, SongRow, TrackDumpRow, TrackRecord};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const ARTISTS_FILE: &str = "artists.csv";
pub const SONGS_FILE: &str = "songs_processed.csv";
pub const DUMP_FILE: &str = "songs.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{labels} cluster labels for {records} records")]
    LabelCountMismatch { records: usize, labels: usize },

    #[error("Row {index}: record {expected} carries label for {found}")]
    Misaligned {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("No cluster label for song {0}")]
    MissingLabel(String),

    #[error("Failed to write {0}: {1}")]
    Write(PathBuf, String),
}

/// In-memory form of the exported datasets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    pub artists: Vec<ArtistRecord>,
    pub songs: Vec<SongRow>,
    pub dump: Vec<TrackDumpRow>,
}

/// Paths of the written files
#[derive(Debug, Clone, Serialize)]
pub struct ExportPaths {
    pub artists: PathBuf,
    pub songs: PathBuf,
    pub dump: PathBuf,
}

pub struct DatasetExporter {
    output_dir: PathBuf,
}

impl DatasetExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Merge labels onto records by song id
    ///
    /// The assignment must list exactly the records' song ids in record order.
    pub fn build(
        records: &[TrackRecord],
        assignment: &ClusterAssignment,
    ) -> Result<Datasets, ExportError> {
        if assignment.len() != records.len() {
            return Err(ExportError::LabelCountMismatch {
                records: records.len(),
                labels: assignment.len(),
            });
        }

        for (index, (record, (id, _))) in records.iter().zip(assignment.iter()).enumerate() {
            if record.song_id != id {
                return Err(ExportError::Misaligned {
                    index,
                    expected: record.song_id.clone(),
                    found: id.to_string(),
                });
            }
        }

        let labels: HashMap<&str, usize> = assignment.iter().collect();

        let mut datasets = Datasets::default();
        let mut seen_artists = HashSet::new();

        for record in records {
            let cluster_id = *labels
                .get(record.song_id.as_str())
                .ok_or_else(|| ExportError::MissingLabel(record.song_id.clone()))?;

            if seen_artists.insert(record.artist_id.as_str()) {
                datasets.artists.push(record.artist());
            }
            datasets.songs.push(SongRow::from_record(record, cluster_id));
            datasets.dump.push(TrackDumpRow::from_record(record, cluster_id));
        }

        debug!(
            "Built {} song rows, {} artist rows",
            datasets.songs.len(),
            datasets.artists.len()
        );
        Ok(datasets)
    }

    /// Write all datasets, replacing previous outputs
    ///
    /// All three files are staged as temp siblings before any is renamed into
    /// place. A failed write leaves the previous outputs untouched.
    pub fn write(&self, datasets: &Datasets) -> Result<ExportPaths, ExportError> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| ExportError::Write(self.output_dir.clone(), e.to_string()))?;

        let paths = ExportPaths {
            artists: self.output_dir.join(ARTISTS_FILE),
            songs: self.output_dir.join(SONGS_FILE),
            dump: self.output_dir.join(DUMP_FILE),
        };

        let mut staged = Vec::with_capacity(3);
        let result = stage_csv(&paths.artists, &datasets.artists, &mut staged)
            .and_then(|()| stage_csv(&paths.songs, &datasets.songs, &mut staged))
            .and_then(|()| stage_csv(&paths.dump, &datasets.dump, &mut staged));
        if let Err(e) = result {
            for (tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
            return Err(e);
        }

        for (tmp, path) in &staged {
            fs::rename(tmp, path)
                .map_err(|e| ExportError::Write(path.clone(), e.to_string()))?;
        }

        info!(
            "Wrote {} artists and {} songs to {}",
            datasets.artists.len(),
            datasets.songs.len(),
            self.output_dir.display()
        );
        Ok(paths)
    }
}

/// Serialize rows (with header) to the temp sibling of `path`
///
/// On success `(temp, path)` is pushed onto `staged`.
fn stage_csv<T: Serialize>(
    path: &Path,
    rows: &[T],
    staged: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<(), ExportError> {
    let tmp = temp_sibling(path);
    let write_err = |e: &dyn std::fmt::Display| ExportError::Write(path.to_path_buf(), e.to_string());

    let written = csv::Writer::from_path(&tmp)
        .map_err(|e| write_err(&e))
        .and_then(|mut writer| {
            for row in rows {
                writer.serialize(row).map_err(|e| write_err(&e))?;
            }
            writer.flush().map_err(|e| write_err(&e))
        });

    match written {
        Ok(()) => {
            staged.push((tmp, path.to_path_buf()));
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// `<dir>/.<name>.tmp`
pub fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cluster_assigner::{ClusterAssigner, KMeansConfig};
    use crate::services::feature_matrix::FeatureMatrixBuilder;
    use tempfile::TempDir;

    fn record(id: &str, artist_id: &str, artist_name: &str, tempo: f64) -> TrackRecord {
        TrackRecord {
            song_id: id.to_string(),
            title: format!("Song {}", id),
            artist_id: artist_id.to_string(),
            artist_name: artist_name.to_string(),
            tempo,
            key: 5,
            mode: 1,
            release_year: 1994,
            energy: 0.5,
            danceability: 0.5,
            loudness: -9.0,
        }
    }

    fn assign(records: &[TrackRecord], k: usize) -> ClusterAssignment {
        let matrix = FeatureMatrixBuilder::build(records).matrix;
        ClusterAssigner::new(KMeansConfig::with_k(k, 42).unwrap())
            .assign(&matrix)
            .unwrap()
    }

    #[test]
    fn test_artists_deduplicated_first_name_wins() {
        let records = vec![
            record("TR1", "AR1", "First Name", 60.0),
            record("TR2", "AR2", "Other", 120.0),
            record("TR3", "AR1", "Second Name", 180.0),
        ];
        let datasets = DatasetExporter::build(&records, &assign(&records, 2)).unwrap();

        assert_eq!(datasets.artists.len(), 2);
        assert_eq!(datasets.artists[0].artist_id, "AR1");
        assert_eq!(datasets.artists[0].name, "First Name");
        assert_eq!(datasets.songs.len(), 3);
    }

    #[test]
    fn test_song_rows_carry_labels_in_order() {
        let records = vec![
            record("TR1", "AR1", "a", 60.0),
            record("TR2", "AR2", "b", 61.0),
            record("TR3", "AR3", "c", 180.0),
        ];
        let assignment = assign(&records, 2);
        let datasets = DatasetExporter::build(&records, &assignment).unwrap();

        for (row, (id, label)) in datasets.songs.iter().zip(assignment.iter()) {
            assert_eq!(row.song_id, id);
            assert_eq!(row.cluster_id, label);
        }
        assert_eq!(datasets.songs[0].cluster_id, datasets.songs[1].cluster_id);
        assert_ne!(datasets.songs[0].cluster_id, datasets.songs[2].cluster_id);
    }

    #[test]
    fn test_every_song_artist_resolves() {
        let records = vec![
            record("TR1", "AR1", "a", 60.0),
            record("TR2", "AR1", "a", 90.0),
            record("TR3", "AR9", "z", 150.0),
        ];
        let datasets = DatasetExporter::build(&records, &assign(&records, 2)).unwrap();
        let artist_ids: HashSet<&str> =
            datasets.artists.iter().map(|a| a.artist_id.as_str()).collect();
        assert!(datasets.songs.iter().all(|s| artist_ids.contains(s.artist_id.as_str())));
    }

    #[test]
    fn test_misaligned_labels_rejected() {
        let records = vec![record("TR1", "AR1", "a", 60.0), record("TR2", "AR2", "b", 180.0)];
        let assignment = assign(&records, 2);

        let swapped = vec![records[1].clone(), records[0].clone()];
        assert!(matches!(
            DatasetExporter::build(&swapped, &assignment),
            Err(ExportError::Misaligned { index: 0, .. })
        ));

        assert!(matches!(
            DatasetExporter::build(&records[..1], &assignment),
            Err(ExportError::LabelCountMismatch { records: 1, labels: 2 })
        ));
    }

    #[test]
    fn test_write_creates_csv_files_with_headers() {
        let temp_dir = TempDir::new().unwrap();
        let records = vec![record("TR1", "AR1", "a", 60.0), record("TR2", "AR2", "b", 180.0)];
        let datasets = DatasetExporter::build(&records, &assign(&records, 2)).unwrap();

        let exporter = DatasetExporter::new(temp_dir.path().join("out"));
        let paths = exporter.write(&datasets).unwrap();

        let songs = fs::read_to_string(&paths.songs).unwrap();
        let header = songs.lines().next().unwrap();
        assert_eq!(
            header,
            "song_id,title,key_signature,mode,release_year,tempo,energy,danceability,loudness,cluster_id,artist_id"
        );
        assert_eq!(songs.lines().count(), 3);

        let artists = fs::read_to_string(&paths.artists).unwrap();
        assert_eq!(artists.lines().next().unwrap(), "artist_id,name");

        let dump = fs::read_to_string(&paths.dump).unwrap();
        assert!(dump.lines().next().unwrap().contains("artist_name"));

        assert!(!temp_sibling(&paths.songs).exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = DatasetExporter::new(temp_dir.path());

        let records = vec![
            record("TR1", "AR1", "a", 60.0),
            record("TR2", "AR2", "b", 120.0),
            record("TR3", "AR3", "c", 180.0),
        ];
        let paths = exporter
            .write(&DatasetExporter::build(&records, &assign(&records, 2)).unwrap())
            .unwrap();
        let artists_before = fs::read_to_string(&paths.artists).unwrap();
        let songs_before = fs::read_to_string(&paths.songs).unwrap();

        // A directory where the dump's temp file should go makes the last stage fail
        fs::create_dir(temp_sibling(&paths.dump)).unwrap();

        let fewer = &records[..2];
        let result = exporter.write(&DatasetExporter::build(fewer, &assign(fewer, 2)).unwrap());

        assert!(matches!(result, Err(ExportError::Write(_, _))));
        assert_eq!(fs::read_to_string(&paths.artists).unwrap(), artists_before);
        assert_eq!(fs::read_to_string(&paths.songs).unwrap(), songs_before);
        assert!(!temp_sibling(&paths.artists).exists());
        assert!(!temp_sibling(&paths.songs).exists());
    }

    #[test]
    fn test_write_overwrites_previous_output() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = DatasetExporter::new(temp_dir.path());

        let records = vec![
            record("TR1", "AR1", "a", 60.0),
            record("TR2", "AR2", "b", 120.0),
            record("TR3", "AR3", "c", 180.0),
        ];
        exporter
            .write(&DatasetExporter::build(&records, &assign(&records, 2)).unwrap())
            .unwrap();

        let fewer = &records[..2];
        let paths = exporter
            .write(&DatasetExporter::build(fewer, &assign(fewer, 2)).unwrap())
            .unwrap();

        let songs = fs::read_to_string(paths.songs).unwrap();
        assert_eq!(songs.lines().count(), 3);
    }
}
