//! Pipeline Orchestrator
//!
//! Runs the batch job end to end:
//! - **Scan**: discover source documents, extract records with fallbacks
//! - **Build**: assemble the feature matrix
//! - **Normalize**: z-score every feature column
//! - **Cluster**: deterministic k-means
//! - **Export**: merge labels by song id, write datasets and run summary
//!
//! # Error Handling
//! - Per-file errors are absorbed by the scanner (logged, counted, skipped)
//! - Fatal conditions (no sources, no records, fewer rows than clusters,
//!   label misalignment, write failures) abort the run with [`PipelineError`]
//!
//! # Example
//! ```rust,ignore
//! let config = PipelineConfig::from_toml(&TomlConfig::default())?;
//! let output = Pipeline::new(config).run()?;
//! ```

use crate::error::{PipelineError, PipelineResult};
use crate::models::run_summary::{BuildInfo, ClusterSummary, RunSummary};
use crate::services::{
    ClusterAssigner, ClusterAssignment, ColumnStats, DatasetExporter, Datasets,
    FeatureMatrixBuilder, KMeansConfig, Normalizer, RecordScanner,
};
use chrono::Utc;
use songsim_common::config::TomlConfig;
use songsim_common::TrackRecord;
use std::path::PathBuf;
use tracing::{info, info_span};
use uuid::Uuid;

/// Resolved pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub max_records: usize,
    pub imputation_seed: u64,
    pub kmeans: KMeansConfig,
}

impl PipelineConfig {
    /// Validate a bootstrap configuration and convert it
    pub fn from_toml(config: &TomlConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            root: config.scan.root.clone(),
            output_dir: config.output.dir.clone(),
            max_records: config.scan.max_records,
            imputation_seed: config.imputation.seed,
            kmeans: KMeansConfig::try_from(&config.cluster)?,
        })
    }
}

/// In-memory result of stages Build → Export
#[derive(Debug, Clone)]
pub struct ClusteredDataset {
    pub datasets: Datasets,
    pub assignment: ClusterAssignment,
    pub column_stats: Vec<ColumnStats>,
    pub repaired_cells: usize,
}

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub summary: RunSummary,
    pub summary_path: PathBuf,
    pub datasets: Datasets,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Scan, cluster and export; outputs replace any previous run's
    pub fn run(&self) -> PipelineResult<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        let _enter = span.enter();
        let started_at = Utc::now();

        info!("Processing source documents under {}", self.config.root.display());

        let scan = RecordScanner::new(self.config.max_records, self.config.imputation_seed)
            .scan(&self.config.root)?;

        if scan.files_discovered == 0 {
            return Err(PipelineError::NoSourceFiles(self.config.root.clone()));
        }
        if scan.records.is_empty() {
            return Err(PipelineError::NoUsableRecords {
                files: scan.files.len(),
            });
        }

        let clustered = self.cluster_records(&scan.records)?;

        let exporter = DatasetExporter::new(&self.config.output_dir);
        let paths = exporter.write(&clustered.datasets)?;

        let summary = RunSummary {
            run_id,
            build: BuildInfo::current(),
            started_at,
            finished_at: Utc::now(),
            root: self.config.root.clone(),
            max_records: self.config.max_records,
            imputation_seed: self.config.imputation_seed,
            files_discovered: scan.files_discovered,
            files_examined: scan.files.len(),
            records: scan.records.len(),
            outcomes: scan.tally,
            repaired_cells: clustered.repaired_cells,
            column_stats: clustered.column_stats,
            clustering: ClusterSummary {
                k: clustered.assignment.k,
                seed: self.config.kmeans.seed,
                n_init: self.config.kmeans.n_init,
                iterations: clustered.assignment.iterations,
                inertia: clustered.assignment.inertia,
                sizes: clustered.assignment.cluster_sizes(),
            },
            artists: clustered.datasets.artists.len(),
            outputs: Some(paths),
        };
        let summary_path = summary
            .write_to(&self.config.output_dir)
            .map_err(PipelineError::Summary)?;

        info!("Processing complete! Summary: {}", summary_path.display());
        Ok(PipelineOutput {
            summary,
            summary_path,
            datasets: clustered.datasets,
        })
    }

    /// Build → Normalize → Cluster → merge, without touching the filesystem
    pub fn cluster_records(&self, records: &[TrackRecord]) -> PipelineResult<ClusteredDataset> {
        let built = FeatureMatrixBuilder::build(records);
        let normalized = Normalizer::normalize(&built.matrix)?;

        let assignment = ClusterAssigner::new(self.config.kmeans.clone()).assign(&normalized.matrix)?;
        info!(
            "Clustered {} songs into {} clusters (inertia {:.4}, {} iterations)",
            assignment.len(),
            assignment.distinct_labels(),
            assignment.inertia,
            assignment.iterations
        );

        let datasets = DatasetExporter::build(records, &assignment)?;

        Ok(ClusteredDataset {
            datasets,
            assignment,
            column_stats: normalized.stats.to_vec(),
            repaired_cells: built.repaired_cells,
        })
    }
}
