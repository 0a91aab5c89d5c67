//! # Preprocessing Driver
//!
//! Selects between processing a single caller-supplied dataset and the
//! configured menu of named datasets, and between serial and parallel
//! execution.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

use super::fan_out::{panic_message, FanOut};
use super::report::{FanOutReport, WorkerOutcome, WorkerStatus};
use crate::config::{ExecutionMode, PreprocessConfig};
use crate::dataset::{run_preprocessing, DatasetLoader, MiniBatchDataset};
use crate::error::{PreprocessError, Result};
use crate::partition::split_indices;

/// A configured dataset that has been loaded and is ready to process
struct LoadedDataset {
    key: String,
    worker_count: usize,
    dataset: Arc<dyn MiniBatchDataset>,
}

/// Runs mini-batch preprocessing for one or more datasets
pub struct PreprocessDriver {
    loader: Arc<dyn DatasetLoader>,
}

impl PreprocessDriver {
    pub fn new(loader: Arc<dyn DatasetLoader>) -> Self {
        Self { loader }
    }

    /// Preprocess every sample of a caller-supplied dataset in-process.
    ///
    /// A panic inside the dataset is returned as
    /// [`PreprocessError::WorkerPanicked`] with worker index 0.
    pub async fn process_dataset(dataset: Arc<dyn MiniBatchDataset>) -> Result<()> {
        let name = dataset.name().to_string();
        let task = tokio::spawn(async move { run_preprocessing(dataset.as_ref(), None).await });

        match task.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => Err(PreprocessError::WorkerPanicked {
                dataset: name,
                worker_index: 0,
                message: panic_message(join_error.into_panic()),
            }),
            Err(join_error) => Err(PreprocessError::preprocessing(
                name,
                format!("preprocessing task cancelled: {join_error}"),
            )),
        }
    }

    /// Run every enabled dataset of `config`.
    ///
    /// All datasets are loaded before any work starts, so a bad dataset config
    /// aborts the run early. In serial mode the first preprocessing error is
    /// returned; in parallel mode worker failures are recorded in the report.
    #[instrument(skip(self, config), fields(mode = %config.mode))]
    pub async fn run(&self, config: &PreprocessConfig) -> Result<FanOutReport> {
        config.validate()?;

        let datasets = self.load_enabled(config)?;
        let mut report = FanOutReport::new(config.mode);

        info!(
            run_id = %report.run_id,
            datasets = datasets.len(),
            "🚀 DRIVER: Starting mini-batch preprocessing"
        );

        report.outcomes = match config.mode {
            ExecutionMode::Serial => Self::run_serial(&datasets).await?,
            ExecutionMode::Parallel => Self::run_parallel(&datasets).await?,
        };
        report.finish();

        info!(
            run_id = %report.run_id,
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            "🎉 DRIVER: All done ({})",
            config.mode
        );

        Ok(report)
    }

    fn load_enabled(&self, config: &PreprocessConfig) -> Result<Vec<LoadedDataset>> {
        config
            .enabled_datasets()
            .into_iter()
            .map(|(key, job)| {
                let path = config.resolve_config_path(job);
                info!(dataset = %key, path = %path.display(), "Loading dataset");
                let dataset = self.loader.load_dataset_from_config(&path)?;
                Ok(LoadedDataset {
                    key: key.to_string(),
                    worker_count: job.worker_count,
                    dataset,
                })
            })
            .collect()
    }

    async fn run_serial(datasets: &[LoadedDataset]) -> Result<Vec<WorkerOutcome>> {
        let mut outcomes = Vec::with_capacity(datasets.len());

        for loaded in datasets {
            let started = Instant::now();
            if let Err(e) = Self::process_dataset(loaded.dataset.clone()).await {
                error!(
                    dataset = %loaded.key,
                    error = %e,
                    "❌ DRIVER: Serial preprocessing failed"
                );
                return Err(e);
            }

            outcomes.push(WorkerOutcome::for_whole_dataset(
                loaded.dataset.name(),
                loaded.dataset.num_samples(),
                WorkerStatus::Succeeded,
                started.elapsed().as_millis() as u64,
            ));
        }

        Ok(outcomes)
    }

    async fn run_parallel(datasets: &[LoadedDataset]) -> Result<Vec<WorkerOutcome>> {
        let mut workers = FanOut::new();

        for loaded in datasets {
            let plan = split_indices(loaded.dataset.num_samples(), loaded.worker_count)?;
            info!(
                dataset = %loaded.key,
                num_samples = plan.num_samples,
                workers = plan.num_children,
                chunk_len = plan.chunk_len,
                padding = plan.padding,
                "Splitting samples between workers"
            );
            workers.spawn_partitions(loaded.dataset.clone(), plan);
        }

        info!("num workers: {}", workers.len());
        Ok(workers.join_all().await)
    }
}
