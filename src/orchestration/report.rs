//! Per-worker outcomes and the run report collected by the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ExecutionMode;
use crate::partition::Partition;

/// How a worker finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerStatus {
    Succeeded,
    Failed { error: String },
    Panicked { message: String },
}

impl WorkerStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerStatus::Succeeded)
    }
}

/// Result of one worker, recorded when it is joined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerOutcome {
    pub dataset: String,
    pub worker_index: usize,
    /// Number of indices handed to the worker, placeholders included
    pub partition_len: usize,
    pub first_index: Option<usize>,
    pub last_index: Option<usize>,
    #[serde(flatten)]
    pub status: WorkerStatus,
    pub elapsed_ms: u64,
}

impl WorkerOutcome {
    pub(crate) fn for_partition(
        dataset: &str,
        partition: &Partition,
        status: WorkerStatus,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            dataset: dataset.to_string(),
            worker_index: partition.worker_index,
            partition_len: partition.len(),
            first_index: partition.first_index(),
            last_index: partition.last_index(),
            status,
            elapsed_ms,
        }
    }

    /// Outcome of a serial run over every sample of a dataset
    pub(crate) fn for_whole_dataset(
        dataset: &str,
        num_samples: usize,
        status: WorkerStatus,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            dataset: dataset.to_string(),
            worker_index: 0,
            partition_len: num_samples,
            first_index: (num_samples > 0).then_some(0),
            last_index: num_samples.checked_sub(1),
            status,
            elapsed_ms,
        }
    }
}

/// Everything a run produced, in spawn order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutReport {
    pub run_id: Uuid,
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<WorkerOutcome>,
}

impl FanOutReport {
    pub fn new(mode: ExecutionMode) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            mode,
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &WorkerOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Utc::now();
    }
}

impl std::fmt::Display for FanOutReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Run {} ({}): {} workers, {} succeeded, {} failed",
            self.run_id,
            self.mode,
            self.worker_count(),
            self.succeeded_count(),
            self.failed_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(worker_index: usize, status: WorkerStatus) -> WorkerOutcome {
        WorkerOutcome {
            dataset: "cars".to_string(),
            worker_index,
            partition_len: 3,
            first_index: Some(worker_index * 3),
            last_index: Some(worker_index * 3 + 2),
            status,
            elapsed_ms: 5,
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = FanOutReport::new(ExecutionMode::Parallel);
        report.outcomes.push(outcome(0, WorkerStatus::Succeeded));
        report.outcomes.push(outcome(
            1,
            WorkerStatus::Failed {
                error: "exit status 1".to_string(),
            },
        ));
        report.outcomes.push(outcome(
            2,
            WorkerStatus::Panicked {
                message: "boom".to_string(),
            },
        ));

        assert_eq!(report.worker_count(), 3);
        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert!(!report.all_succeeded());

        let display = report.to_string();
        assert!(display.contains("3 workers"));
        assert!(display.contains("2 failed"));
    }

    #[test]
    fn test_outcome_serializes_status_inline() {
        let json = serde_json::to_value(outcome(
            1,
            WorkerStatus::Failed {
                error: "bad".to_string(),
            },
        ))
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "bad");
        assert_eq!(json["first_index"], 3);
    }

    #[test]
    fn test_whole_dataset_outcome_bounds() {
        let outcome = WorkerOutcome::for_whole_dataset("all", 0, WorkerStatus::Succeeded, 0);
        assert_eq!(outcome.first_index, None);
        assert_eq!(outcome.last_index, None);

        let outcome = WorkerOutcome::for_whole_dataset("all", 7, WorkerStatus::Succeeded, 0);
        assert_eq!(outcome.first_index, Some(0));
        assert_eq!(outcome.last_index, Some(6));
    }
}
