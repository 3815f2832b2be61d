//! Feature matrix assembly
//!
//! One row per record, columns `[tempo, energy, danceability, loudness]`. The
//! matrix carries the song id of every row so later stages can verify row
//! identity instead of trusting index alignment.

use songsim_common::{TrackRecord, FEATURE_COUNT};
use thiserror::Error;

pub type FeatureRow = [f64; FEATURE_COUNT];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("Row count {rows} does not match id count {ids}")]
    ShapeMismatch { rows: usize, ids: usize },
}

/// Ordered numeric feature table with row identities
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    song_ids: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn new(song_ids: Vec<String>, rows: Vec<FeatureRow>) -> Result<Self, MatrixError> {
        if song_ids.len() != rows.len() {
            return Err(MatrixError::ShapeMismatch {
                rows: rows.len(),
                ids: song_ids.len(),
            });
        }
        Ok(Self { song_ids, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn song_ids(&self) -> &[String] {
        &self.song_ids
    }

    /// Values of one column, in row order
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Same ids and order, rows transformed
    pub fn map_rows(&self, f: impl Fn(&FeatureRow) -> FeatureRow) -> Self {
        Self {
            song_ids: self.song_ids.clone(),
            rows: self.rows.iter().map(f).collect(),
        }
    }
}

/// Matrix plus the number of cells the safety net repaired
#[derive(Debug, Clone)]
pub struct BuiltMatrix {
    pub matrix: FeatureMatrix,
    pub repaired_cells: usize,
}

/// Builds a [`FeatureMatrix`] from records
pub struct FeatureMatrixBuilder;

impl FeatureMatrixBuilder {
    /// Assemble the matrix; non-finite cells become 0.0
    pub fn build(records: &[TrackRecord]) -> BuiltMatrix {
        let mut repaired_cells = 0;
        let mut song_ids = Vec::with_capacity(records.len());
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            let mut row = record.features();
            for cell in row.iter_mut() {
                if !cell.is_finite() {
                    *cell = 0.0;
                    repaired_cells += 1;
                }
            }
            song_ids.push(record.song_id.clone());
            rows.push(row);
        }

        if repaired_cells > 0 {
            tracing::warn!("Replaced {} non-finite feature values with 0", repaired_cells);
        }

        BuiltMatrix {
            matrix: FeatureMatrix { song_ids, rows },
            repaired_cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, tempo: f64, energy: f64) -> TrackRecord {
        TrackRecord {
            song_id: id.to_string(),
            title: "t".to_string(),
            artist_id: "AR1".to_string(),
            artist_name: "a".to_string(),
            tempo,
            key: 0,
            mode: 1,
            release_year: 2000,
            energy,
            danceability: 0.25,
            loudness: -8.0,
        }
    }

    #[test]
    fn test_rows_follow_record_order() {
        let records = vec![record("a", 60.0, 0.1), record("b", 180.0, 0.9)];
        let built = FeatureMatrixBuilder::build(&records);

        assert_eq!(built.matrix.song_ids(), &["a".to_string(), "b".to_string()]);
        assert_eq!(built.matrix.rows()[0], [60.0, 0.1, 0.25, -8.0]);
        assert_eq!(built.matrix.rows()[1], [180.0, 0.9, 0.25, -8.0]);
        assert_eq!(built.repaired_cells, 0);
    }

    #[test]
    fn test_nan_replaced_with_zero() {
        let records = vec![record("a", f64::NAN, 0.5), record("b", 100.0, f64::INFINITY)];
        let built = FeatureMatrixBuilder::build(&records);

        assert_eq!(built.matrix.rows()[0][0], 0.0);
        assert_eq!(built.matrix.rows()[1][1], 0.0);
        assert_eq!(built.repaired_cells, 2);
        // input untouched
        assert!(records[0].tempo.is_nan());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = FeatureMatrix::new(vec!["a".to_string()], vec![]);
        assert_eq!(result, Err(MatrixError::ShapeMismatch { rows: 0, ids: 1 }));
    }

    #[test]
    fn test_column_extraction() {
        let records = vec![record("a", 60.0, 0.1), record("b", 180.0, 0.9)];
        let built = FeatureMatrixBuilder::build(&records);
        assert_eq!(built.matrix.column(0), vec![60.0, 180.0]);
    }
}
