//! songsim-pipeline - batch entry point
//!
//! `run` scans the source tree, clusters the tracks and writes
//! `artists.csv`, `songs_processed.csv`, `songs.csv` and `run_summary.json`.
//! `inspect` prints the group/table/field layout of the first source document.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use songsim_common::config::{ConfigFileResolver, LoggingConfig, TomlConfig};
use songsim_pipeline::services::inspect_first;
use songsim_pipeline::{Pipeline, PipelineConfig};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for songsim-pipeline
#[derive(Parser, Debug)]
#[command(name = "songsim-pipeline")]
#[command(about = "Cluster tracks by acoustic features and export CSV datasets")]
#[command(version)]
struct Cli {
    /// Bootstrap TOML configuration file (default: $SONGSIM_CONFIG, then the
    /// platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline
    Run(RunArgs),
    /// Print the layout of the first source document
    Inspect {
        /// Root of the source document tree
        #[arg(short, long, env = "SONGSIM_ROOT")]
        root: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Root of the source document tree
    #[arg(short, long, env = "SONGSIM_ROOT")]
    root: Option<PathBuf>,

    /// Output directory for datasets
    #[arg(short, long, env = "SONGSIM_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Stop after this many records
    #[arg(long, env = "SONGSIM_MAX_RECORDS")]
    max_records: Option<usize>,

    /// Number of clusters
    #[arg(short = 'k', long, env = "SONGSIM_CLUSTERS")]
    clusters: Option<usize>,

    /// Seed for centroid initialization
    #[arg(long, env = "SONGSIM_SEED")]
    seed: Option<u64>,

    /// Seed for fallback value generation
    #[arg(long, env = "SONGSIM_IMPUTATION_SEED")]
    imputation_seed: Option<u64>,
}

impl RunArgs {
    /// Command-line and environment values override the file
    fn apply(&self, config: &mut TomlConfig) {
        if let Some(root) = &self.root {
            config.scan.root = root.clone();
        }
        if let Some(output) = &self.output {
            config.output.dir = output.clone();
        }
        if let Some(max_records) = self.max_records {
            config.scan.max_records = max_records;
        }
        if let Some(k) = self.clusters {
            config.cluster.k = k;
        }
        if let Some(seed) = self.seed {
            config.cluster.seed = seed;
        }
        if let Some(seed) = self.imputation_seed {
            config.imputation.seed = seed;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config is read before logging exists; report how it went afterwards
    let config_path = ConfigFileResolver::new(cli.config.clone()).resolve();
    let (mut config, source) = TomlConfig::load_or_default(config_path.as_deref());

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }
    source.log();

    let outcome = match cli.command {
        Command::Run(args) => {
            args.apply(&mut config);
            run(&config)
        }
        Command::Inspect { root } => {
            let root = root.unwrap_or_else(|| config.scan.root.clone());
            inspect(&root)
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &TomlConfig) -> Result<()> {
    let pipeline_config = PipelineConfig::from_toml(config).context("Invalid configuration")?;

    info!("Starting songsim-pipeline v{}", env!("CARGO_PKG_VERSION"));
    info!("Source root: {}", pipeline_config.root.display());
    info!("Output directory: {}", pipeline_config.output_dir.display());

    let output = Pipeline::new(pipeline_config)
        .run()
        .context("Pipeline run failed")?;

    let summary = &output.summary;
    info!(
        "{} songs, {} artists, {} clusters written ({} fallbacks, {} files skipped)",
        summary.records,
        summary.artists,
        summary.clustering.k,
        summary.outcomes.total_fallbacks(),
        summary.outcomes.skipped
    );
    Ok(())
}

fn inspect(root: &Path) -> Result<()> {
    let layout = inspect_first(root)
        .with_context(|| format!("Failed to inspect {}", root.display()))?;
    println!("{}", layout);
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "songsim_pipeline={level},songsim_common={level}",
            level = logging.level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?;
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
    }
    Ok(())
}
