//! Deterministic k-means clustering
//!
//! Lloyd iterations from k-means++ initial centroids drawn with a seeded PRNG.
//! `n_init` restarts run from the same PRNG stream and the lowest-inertia
//! result wins. Labels are renumbered by first appearance in row order, so
//! identical input, K and seed always give identical labels and numbering.
//!
//! Label numbers carry no meaning across runs with different inputs.

use crate::services::feature_matrix::{FeatureMatrix, FeatureRow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use songsim_common::config::ClusterConfig;
use songsim_common::FEATURE_COUNT;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum ClusterError {
    #[error("Cannot cluster an empty feature matrix")]
    EmptyMatrix,

    #[error("Invalid clustering configuration: {0}")]
    InvalidConfig(String),

    #[error("Need at least {k} rows to form {k} clusters, got {rows}")]
    InsufficientRows { rows: usize, k: usize },
}

/// Validated k-means parameters
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    pub k: usize,
    pub seed: u64,
    pub max_iterations: usize,
    /// Stop when the summed squared centroid shift falls to this value
    pub tolerance: f64,
    pub n_init: usize,
}

impl KMeansConfig {
    pub fn new(
        k: usize,
        seed: u64,
        max_iterations: usize,
        tolerance: f64,
        n_init: usize,
    ) -> Result<Self, ClusterError> {
        if k == 0 {
            return Err(ClusterError::InvalidConfig("k must be > 0".to_string()));
        }
        if max_iterations == 0 {
            return Err(ClusterError::InvalidConfig("max_iterations must be > 0".to_string()));
        }
        if n_init == 0 {
            return Err(ClusterError::InvalidConfig("n_init must be > 0".to_string()));
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ClusterError::InvalidConfig(
                "tolerance must be a finite non-negative number".to_string(),
            ));
        }
        Ok(Self {
            k,
            seed,
            max_iterations,
            tolerance,
            n_init,
        })
    }

    /// Defaults (300 iterations, tolerance 1e-4, 10 restarts) for a given K and seed
    pub fn with_k(k: usize, seed: u64) -> Result<Self, ClusterError> {
        Self::new(k, seed, 300, 1e-4, 10)
    }
}

impl TryFrom<&ClusterConfig> for KMeansConfig {
    type Error = ClusterError;

    fn try_from(config: &ClusterConfig) -> Result<Self, Self::Error> {
        Self::new(
            config.k,
            config.seed,
            config.max_iterations,
            config.tolerance,
            config.n_init,
        )
    }
}

/// Labels keyed by song id, in matrix row order
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    song_ids: Vec<String>,
    labels: Vec<usize>,
    pub k: usize,
    pub centroids: Vec<FeatureRow>,
    pub inertia: f64,
    /// Lloyd iterations of the winning restart
    pub iterations: usize,
}

impl ClusterAssignment {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn song_ids(&self) -> &[String] {
        &self.song_ids
    }

    /// (song_id, label) pairs in row order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.song_ids
            .iter()
            .map(String::as_str)
            .zip(self.labels.iter().copied())
    }

    /// Members per label, indexed by label
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    pub fn distinct_labels(&self) -> usize {
        self.cluster_sizes().iter().filter(|&&n| n > 0).count()
    }
}

/// One k-means restart
struct Fit {
    labels: Vec<usize>,
    centroids: Vec<FeatureRow>,
    inertia: f64,
    iterations: usize,
}

pub struct ClusterAssigner {
    config: KMeansConfig,
}

impl ClusterAssigner {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Partition the rows of `matrix` into K clusters
    pub fn assign(&self, matrix: &FeatureMatrix) -> Result<ClusterAssignment, ClusterError> {
        let k = self.config.k;
        let points = matrix.rows();

        if points.is_empty() {
            return Err(ClusterError::EmptyMatrix);
        }
        if points.len() < k {
            return Err(ClusterError::InsufficientRows {
                rows: points.len(),
                k,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<Fit> = None;

        for restart in 0..self.config.n_init {
            let fit = self.fit_once(points, &mut rng);
            debug!(
                "k-means restart {}: inertia {:.6} after {} iterations",
                restart, fit.inertia, fit.iterations
            );
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        // n_init >= 1, so a fit always exists
        let Some(best) = best else {
            return Err(ClusterError::InvalidConfig("n_init must be > 0".to_string()));
        };
        let (labels, centroids) = canonical_order(best.labels, best.centroids);

        Ok(ClusterAssignment {
            song_ids: matrix.song_ids().to_vec(),
            labels,
            k,
            centroids,
            inertia: best.inertia,
            iterations: best.iterations,
        })
    }

    fn fit_once(&self, points: &[FeatureRow], rng: &mut StdRng) -> Fit {
        let k = self.config.k;
        let mut centroids = kmeans_plus_plus_init(points, k, rng);
        let mut labels = vec![0usize; points.len()];
        let mut iterations = 0;

        for _ in 0..self.config.max_iterations {
            iterations += 1;
            assign_labels(points, &centroids, &mut labels);

            let mut updated = compute_centroids(points, &labels, &centroids);
            reseed_empty_clusters(points, &mut labels, &mut updated);

            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = updated;

            if shift <= self.config.tolerance {
                break;
            }
        }

        // Final labels always agree with the returned centroids
        assign_labels(points, &centroids, &mut labels);
        let inertia: f64 = points
            .iter()
            .zip(&labels)
            .map(|(p, &l)| squared_distance(p, &centroids[l]))
            .sum();

        Fit {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

/// k-means++ seeding: first centroid uniform, then proportional to D²
pub fn kmeans_plus_plus_init(points: &[FeatureRow], k: usize, rng: &mut StdRng) -> Vec<FeatureRow> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)]);

    let mut min_distances: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_distances.iter().sum();
        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = n - 1;
            for (i, d) in min_distances.iter().enumerate() {
                cumulative += d;
                if cumulative > target {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // Every point sits on a centroid
            rng.gen_range(0..n)
        };

        let centroid = points[next];
        for (d, p) in min_distances.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Nearest centroid per point; ties go to the lower index
fn assign_labels(points: &[FeatureRow], centroids: &[FeatureRow], labels: &mut [usize]) {
    for (label, point) in labels.iter_mut().zip(points) {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (c, centroid) in centroids.iter().enumerate() {
            let d = squared_distance(point, centroid);
            if d < best_distance {
                best_distance = d;
                best = c;
            }
        }
        *label = best;
    }
}

/// Mean of assigned points; empty clusters keep their previous centroid
fn compute_centroids(
    points: &[FeatureRow],
    labels: &[usize],
    previous: &[FeatureRow],
) -> Vec<FeatureRow> {
    let k = previous.len();
    let mut sums = vec![[0.0f64; FEATURE_COUNT]; k];
    let mut counts = vec![0usize; k];

    for (point, &label) in points.iter().zip(labels) {
        counts[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(point) {
            *s += v;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((mut sum, count), prev)| {
            if count == 0 {
                return *prev;
            }
            for s in sum.iter_mut() {
                *s /= count as f64;
            }
            sum
        })
        .collect()
}

/// Move each empty cluster's centroid onto the point farthest from its own
/// centroid, taken from a cluster with more than one member
fn reseed_empty_clusters(points: &[FeatureRow], labels: &mut [usize], centroids: &mut [FeatureRow]) {
    let k = centroids.len();
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }

        let farthest = points
            .iter()
            .enumerate()
            .filter(|(i, _)| counts[labels[*i]] > 1)
            .map(|(i, p)| (i, squared_distance(p, &centroids[labels[i]])))
            .filter(|(_, d)| *d > 0.0)
            .fold(None::<(usize, f64)>, |best, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            });

        if let Some((i, _)) = farthest {
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] = 1;
            centroids[empty] = points[i];
        }
    }
}

/// Renumber labels by first appearance in row order
///
/// Clusters that never appear keep their relative order after the used ones.
fn canonical_order(labels: Vec<usize>, centroids: Vec<FeatureRow>) -> (Vec<usize>, Vec<FeatureRow>) {
    let k = centroids.len();
    let mut mapping: Vec<Option<usize>> = vec![None; k];
    let mut next = 0;

    for &label in &labels {
        if mapping[label].is_none() {
            mapping[label] = Some(next);
            next += 1;
        }
    }
    for slot in mapping.iter_mut() {
        if slot.is_none() {
            *slot = Some(next);
            next += 1;
        }
    }

    let mapping: Vec<usize> = mapping.into_iter().map(|m| m.unwrap_or(0)).collect();
    let mut reordered = vec![[0.0; FEATURE_COUNT]; k];
    for (old, centroid) in centroids.into_iter().enumerate() {
        reordered[mapping[old]] = centroid;
    }

    (labels.into_iter().map(|l| mapping[l]).collect(), reordered)
}

fn squared_distance(a: &FeatureRow, b: &FeatureRow) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
