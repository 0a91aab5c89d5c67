//! # Worker Fan-out and Join
//!
//! Spawns one tokio task per partition and joins them in spawn order. Each
//! worker owns its partition and a shared handle to the dataset; nothing else
//! is shared between workers. Joining never short-circuits: every worker is
//! awaited and turned into a [`WorkerOutcome`], whether it succeeded, returned
//! an error or panicked.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, instrument, warn};

use super::report::{WorkerOutcome, WorkerStatus};
use crate::dataset::{run_preprocessing, MiniBatchDataset};
use crate::error::Result;
use crate::logging::{log_error, log_worker_operation};
use crate::partition::{Partition, PartitionPlan};

/// A worker that has been spawned but not yet joined
struct SpawnedWorker {
    dataset: String,
    partition: Partition,
    spawned_at: Instant,
    handle: JoinHandle<(Result<()>, u64)>,
}

/// Set of spawned workers, possibly spanning several datasets
#[derive(Default)]
pub struct FanOut {
    workers: Vec<SpawnedWorker>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of workers spawned so far
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Spawn one worker per partition of `plan`.
    ///
    /// Must be called from within a tokio runtime. Returns the number of
    /// workers spawned.
    pub fn spawn_partitions(
        &mut self,
        dataset: Arc<dyn MiniBatchDataset>,
        plan: PartitionPlan,
    ) -> usize {
        let dataset_name = dataset.name().to_string();

        for partition in plan.padding_only_partitions() {
            warn!(
                dataset = %dataset_name,
                worker_index = partition.worker_index,
                num_samples = plan.num_samples,
                num_children = plan.num_children,
                "🏊 FANOUT: Partition holds only padding and will repeat index 0"
            );
        }

        let partitions = plan.into_partitions();
        let spawned = partitions.len();

        for partition in partitions {
            let worker_dataset = dataset.clone();
            let worker_partition = partition.clone();
            let handle = tokio::spawn(async move {
                let started = Instant::now();
                let result = run_worker(worker_dataset.as_ref(), worker_partition).await;
                (result, started.elapsed().as_millis() as u64)
            });

            self.workers.push(SpawnedWorker {
                dataset: dataset_name.clone(),
                partition,
                spawned_at: Instant::now(),
                handle,
            });
        }

        debug!(
            dataset = %dataset_name,
            workers = spawned,
            "🏊 FANOUT: Spawned workers"
        );
        spawned
    }

    /// Wait for every worker, in spawn order, and collect their outcomes
    #[instrument(skip(self), fields(workers = self.workers.len()))]
    pub async fn join_all(self) -> Vec<WorkerOutcome> {
        info!("🏊 FANOUT: Waiting for {} workers", self.workers.len());

        let mut outcomes = Vec::with_capacity(self.workers.len());
        for worker in self.workers {
            let (status, elapsed_ms) = match worker.handle.await {
                Ok((Ok(()), elapsed_ms)) => (WorkerStatus::Succeeded, elapsed_ms),
                Ok((Err(e), elapsed_ms)) => (
                    WorkerStatus::Failed {
                        error: e.to_string(),
                    },
                    elapsed_ms,
                ),
                Err(join_error) => (
                    status_from_join_error(join_error),
                    worker.spawned_at.elapsed().as_millis() as u64,
                ),
            };

            let outcome = WorkerOutcome::for_partition(
                &worker.dataset,
                &worker.partition,
                status,
                elapsed_ms,
            );
            report_outcome(&outcome);
            outcomes.push(outcome);
        }

        outcomes
    }
}

/// Split-and-spawn a single dataset and join its workers
pub async fn fan_out(
    dataset: Arc<dyn MiniBatchDataset>,
    plan: PartitionPlan,
) -> Vec<WorkerOutcome> {
    let mut workers = FanOut::new();
    workers.spawn_partitions(dataset, plan);
    workers.join_all().await
}

async fn run_worker(dataset: &dyn MiniBatchDataset, partition: Partition) -> Result<()> {
    log_worker_operation(
        "start",
        dataset.name(),
        partition.worker_index,
        partition.first_index(),
        partition.last_index(),
        "running",
        Some(&dataset.classes().join(",")),
    );

    if partition.is_empty() {
        debug!(
            dataset = %dataset.name(),
            worker_index = partition.worker_index,
            "Empty partition, nothing to preprocess"
        );
        return Ok(());
    }

    run_preprocessing(dataset, Some(partition.indices)).await
}

fn status_from_join_error(join_error: JoinError) -> WorkerStatus {
    if join_error.is_panic() {
        WorkerStatus::Panicked {
            message: panic_message(join_error.into_panic()),
        }
    } else {
        WorkerStatus::Failed {
            error: format!("worker task cancelled: {join_error}"),
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn report_outcome(outcome: &WorkerOutcome) {
    match &outcome.status {
        WorkerStatus::Succeeded => log_worker_operation(
            "finish",
            &outcome.dataset,
            outcome.worker_index,
            outcome.first_index,
            outcome.last_index,
            "succeeded",
            Some(&format!("{} ms", outcome.elapsed_ms)),
        ),
        WorkerStatus::Failed { error } => log_error(
            "fan_out",
            "worker",
            error,
            Some(&format!("{} worker #{}", outcome.dataset, outcome.worker_index)),
        ),
        WorkerStatus::Panicked { message } => log_error(
            "fan_out",
            "worker_panic",
            message,
            Some(&format!("{} worker #{}", outcome.dataset, outcome.worker_index)),
        ),
    }
}
