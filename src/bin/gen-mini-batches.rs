//! # Mini-batch Generator
//!
//! Command-line driver that preprocesses RPN mini-batches for the configured
//! datasets, splitting each dataset across worker processes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info};

use mini_batch_fanout::config::{ConfigLoader, ExecutionMode, PreprocessConfig};
use mini_batch_fanout::dataset::ManifestDatasetLoader;
use mini_batch_fanout::logging::{init_structured_logging, LogFormat};
use mini_batch_fanout::orchestration::{FanOutReport, PreprocessDriver};
use mini_batch_fanout::partition::split_indices;

#[derive(Parser)]
#[command(name = "gen-mini-batches")]
#[command(about = "Generate RPN mini-batches for 3D object-detection datasets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess the enabled datasets (default if no command specified)
    Run(RunArgs),

    /// Print how samples would be split between workers
    Plan {
        /// Number of samples in the dataset
        #[arg(long)]
        samples: usize,

        /// Number of workers
        #[arg(long)]
        workers: usize,
    },

    /// Validate the configuration and print it
    Validate,
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// Process each dataset in-process over all samples
    #[arg(long, conflicts_with = "parallel")]
    serial: bool,

    /// Split each dataset across its workers
    #[arg(long)]
    parallel: bool,

    /// Only process the named dataset (repeatable)
    #[arg(long = "only")]
    only: Vec<String>,

    /// Override the worker count of every dataset
    #[arg(long)]
    workers: Option<usize>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_structured_logging(cli.log_format.into());

    let result = match cli.command {
        None => run_command(cli.config, RunArgs::default()).await,
        Some(Commands::Run(args)) => run_command(cli.config, args).await,
        Some(Commands::Plan { samples, workers }) => plan_command(samples, workers),
        Some(Commands::Validate) => validate_command(cli.config),
    };

    if let Err(e) = &result {
        error!("{e:#}");
    }

    let code = exit_code(&result);
    if code != 0 {
        process::exit(code);
    }
}

/// 0 when every worker succeeded, 1 when a worker failed, 2 when the run aborted
fn exit_code(result: &Result<bool>) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<PreprocessConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader.load().context("failed to load configuration")
}

/// Returns whether every worker succeeded
async fn run_command(config_path: Option<PathBuf>, args: RunArgs) -> Result<bool> {
    let mut config = load_config(config_path)?;

    if args.serial {
        config.mode = ExecutionMode::Serial;
    } else if args.parallel {
        config.mode = ExecutionMode::Parallel;
    }
    if !args.only.is_empty() {
        config.restrict_to(&args.only)?;
    }
    if let Some(workers) = args.workers {
        config.set_worker_count(workers);
    }

    let driver = PreprocessDriver::new(Arc::new(ManifestDatasetLoader));
    let report = driver.run(&config).await?;

    if let Some(path) = args.report {
        write_report(&report, &path)?;
    }

    summarize(&report);
    Ok(report.all_succeeded())
}

fn summarize(report: &FanOutReport) {
    info!("{report}");
    for outcome in report.failed() {
        error!(
            dataset = %outcome.dataset,
            worker_index = outcome.worker_index,
            first_index = outcome.first_index,
            last_index = outcome.last_index,
            "Partition incomplete: {:?}",
            outcome.status
        );
    }
}

fn write_report(report: &FanOutReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

fn plan_command(samples: usize, workers: usize) -> Result<bool> {
    let plan = split_indices(samples, workers)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(true)
}

fn validate_command(config_path: Option<PathBuf>) -> Result<bool> {
    let config = load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    info!(
        enabled = config.enabled_datasets().len(),
        mode = %config.mode,
        "✅ Configuration is valid"
    );
    Ok(true)
}
