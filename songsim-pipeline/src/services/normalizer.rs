//! Z-score normalization
//!
//! Each column is rescaled as `(value - mean) / (std + EPSILON)` using the
//! population standard deviation, so no single feature dominates the distance
//! computation in clustering.

use crate::services::feature_matrix::{FeatureMatrix, FeatureRow};
use serde::Serialize;
use songsim_common::{FEATURE_COUNT, FEATURE_NAMES};
use thiserror::Error;

/// Guards division on zero-variance columns
pub const EPSILON: f64 = 1e-8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Cannot normalize an empty feature matrix")]
    EmptyMatrix,
}

/// Per-column statistics used for the transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub feature: &'static str,
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub matrix: FeatureMatrix,
    pub stats: [ColumnStats; FEATURE_COUNT],
}

pub struct Normalizer;

impl Normalizer {
    pub fn normalize(matrix: &FeatureMatrix) -> Result<Normalized, NormalizeError> {
        if matrix.is_empty() {
            return Err(NormalizeError::EmptyMatrix);
        }

        let stats = Self::column_stats(matrix);
        let normalized = matrix.map_rows(|row| {
            let mut out: FeatureRow = [0.0; FEATURE_COUNT];
            for (j, value) in row.iter().enumerate() {
                out[j] = (value - stats[j].mean) / (stats[j].std_dev + EPSILON);
            }
            out
        });

        Ok(Normalized {
            matrix: normalized,
            stats,
        })
    }

    /// Mean and population standard deviation of every column
    pub fn column_stats(matrix: &FeatureMatrix) -> [ColumnStats; FEATURE_COUNT] {
        let n = matrix.len() as f64;
        std::array::from_fn(|j| {
            let column = matrix.column(j);
            let mean = column.iter().sum::<f64>() / n;
            let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            ColumnStats {
                feature: FEATURE_NAMES[j],
                mean,
                std_dev: variance.sqrt(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<FeatureRow>) -> FeatureMatrix {
        let ids = (0..rows.len()).map(|i| format!("TR{}", i)).collect();
        FeatureMatrix::new(ids, rows).unwrap()
    }

    #[test]
    fn test_columns_have_zero_mean_unit_std() {
        let m = matrix(vec![
            [60.0, 0.0, 0.3, -20.0],
            [180.0, 1.0, 0.9, -3.0],
            [120.0, 0.5, 0.1, -9.5],
            [90.0, 0.2, 0.4, -12.0],
            [150.0, 0.8, 0.7, -6.0],
        ]);
        let normalized = Normalizer::normalize(&m).unwrap();
        let stats = Normalizer::column_stats(&normalized.matrix);

        for column in stats {
            assert!(column.mean.abs() < 1e-9, "{} mean {}", column.feature, column.mean);
            assert!(
                (column.std_dev - 1.0).abs() < 1e-6,
                "{} std {}",
                column.feature,
                column.std_dev
            );
        }
    }

    #[test]
    fn test_zero_variance_column_becomes_zero() {
        let m = matrix(vec![
            [120.0, 0.1, 0.5, -5.0],
            [120.0, 0.9, 0.5, -5.0],
            [120.0, 0.4, 0.5, -5.0],
        ]);
        let normalized = Normalizer::normalize(&m).unwrap();

        for row in normalized.matrix.rows() {
            for j in [0, 2, 3] {
                assert!(row[j].is_finite());
                assert!(row[j].abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_shape_and_ids_preserved() {
        let m = matrix(vec![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]);
        let normalized = Normalizer::normalize(&m).unwrap();
        assert_eq!(normalized.matrix.len(), 2);
        assert_eq!(normalized.matrix.song_ids(), m.song_ids());
    }

    #[test]
    fn test_population_std() {
        let m = matrix(vec![[2.0, 0.0, 0.0, 0.0], [4.0, 0.0, 0.0, 0.0]]);
        let stats = Normalizer::column_stats(&m);
        assert_eq!(stats[0].mean, 3.0);
        assert_eq!(stats[0].std_dev, 1.0);
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let m = matrix(vec![]);
        assert!(matches!(Normalizer::normalize(&m), Err(NormalizeError::EmptyMatrix)));
    }
}
