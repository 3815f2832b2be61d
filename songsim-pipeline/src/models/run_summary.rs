//! Run summary report
//!
//! Written as `run_summary.json` next to the datasets after every successful
//! run.

use crate::models::outcome::OutcomeTally;
use crate::services::dataset_exporter::{temp_sibling, ExportPaths};
use crate::services::normalizer::ColumnStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SUMMARY_FILE: &str = "run_summary.json";

/// Build identification baked in by build.rs
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub profile: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            profile: env!("BUILD_PROFILE"),
        }
    }
}

/// Clustering section of the summary
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub k: usize,
    pub seed: u64,
    pub n_init: usize,
    pub iterations: usize,
    pub inertia: f64,
    /// Members per cluster, indexed by cluster_id
    pub sizes: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub build: BuildInfo,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub root: PathBuf,
    pub max_records: usize,
    pub imputation_seed: u64,
    pub files_discovered: usize,
    pub files_examined: usize,
    pub records: usize,
    pub outcomes: OutcomeTally,
    pub repaired_cells: usize,
    pub column_stats: Vec<ColumnStats>,
    pub clustering: ClusterSummary,
    pub artists: usize,
    pub outputs: Option<ExportPaths>,
}

impl RunSummary {
    /// Write pretty JSON to `<dir>/run_summary.json`, replacing any previous one
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(SUMMARY_FILE);
        let tmp = temp_sibling(&path);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(path)
    }
}
