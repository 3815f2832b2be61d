//! Bootstrap configuration loading
//!
//! Configuration is resolved in priority order:
//! 1. Command-line argument / environment variable (applied by the binary)
//! 2. TOML configuration file
//! 3. Compiled defaults
//!
//! A missing or unreadable TOML file never terminates the program: the compiled
//! defaults are used instead and the failure is reported as a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "SONGSIM_CONFIG";

/// File name looked up inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "songsim.toml";

/// Complete bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub imputation: ImputationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Source discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Root of the source document tree
    #[serde(default = "default_scan_root")]
    pub root: PathBuf,

    /// Stop after this many records have been extracted
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

/// k-means settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of clusters (K)
    #[serde(default = "default_k")]
    pub k: usize,

    /// Seed for centroid initialization
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Iteration cap per restart
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Convergence threshold on total squared centroid shift
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Number of seeded restarts; lowest inertia wins
    #[serde(default = "default_n_init")]
    pub n_init: usize,
}

/// Fallback value generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationConfig {
    /// Base seed for fallback values
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Dataset output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the CSV datasets and run summary
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_scan_root() -> PathBuf {
    PathBuf::from("MillionSongSubset")
}

fn default_max_records() -> usize {
    200
}

fn default_k() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

fn default_max_iterations() -> usize {
    300
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_n_init() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: default_scan_root(),
            max_records: default_max_records(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            n_init: default_n_init(),
        }
    }
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration, falling back to compiled defaults
    ///
    /// `None` or a missing/invalid file yields the defaults. Nothing is logged
    /// here: the returned [`ConfigSource`] is reported once logging is running,
    /// since the logging settings themselves come from this file.
    pub fn load_or_default(path: Option<&Path>) -> (Self, ConfigSource) {
        let Some(path) = path else {
            return (Self::default(), ConfigSource::Defaults);
        };

        match Self::load(path) {
            Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
            Err(e) => (Self::default(), ConfigSource::FallbackToDefaults(path.to_path_buf(), e)),
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scan.max_records == 0 {
            return Err(Error::Config("scan.max_records must be > 0".to_string()));
        }
        if self.cluster.k == 0 {
            return Err(Error::Config("cluster.k must be > 0".to_string()));
        }
        if self.cluster.max_iterations == 0 {
            return Err(Error::Config("cluster.max_iterations must be > 0".to_string()));
        }
        if self.cluster.n_init == 0 {
            return Err(Error::Config("cluster.n_init must be > 0".to_string()));
        }
        if !self.cluster.tolerance.is_finite() || self.cluster.tolerance < 0.0 {
            return Err(Error::Config(
                "cluster.tolerance must be a finite non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// No config file was found
    Defaults,
    /// Loaded from this file
    File(PathBuf),
    /// This file could not be used; defaults are in effect
    FallbackToDefaults(PathBuf, Error),
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => info!("No config file found, using built-in defaults"),
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::FallbackToDefaults(_, e) => warn!("{}; using built-in defaults", e),
        }
    }
}

/// Config file path resolution
///
/// Priority: explicit path → `SONGSIM_CONFIG` → platform config directory.
pub struct ConfigFileResolver {
    explicit: Option<PathBuf>,
}

impl ConfigFileResolver {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }

    /// Resolve the config file to read, if any
    ///
    /// Explicit and environment paths are returned even when they do not
    /// exist, so the loader can warn about them. The platform default is only
    /// returned when present.
    pub fn resolve(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path().filter(|p| p.exists())
    }
}

/// `<config_dir>/songsim/songsim.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songsim").join(CONFIG_FILE_NAME))
}
