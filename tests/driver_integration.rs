//! Driver Integration Tests
//!
//! Serial and parallel runs of the configured dataset menu against mock
//! datasets.

mod common;

use common::{MockDataset, MockLoader};
use mini_batch_fanout::config::{DatasetJobConfig, ExecutionMode, PreprocessConfig};
use mini_batch_fanout::error::PreprocessError;
use mini_batch_fanout::orchestration::{PreprocessDriver, WorkerStatus};
use std::path::PathBuf;
use std::sync::Arc;

fn config_for(mode: ExecutionMode, enabled: &[(&str, usize)]) -> PreprocessConfig {
    let mut config = PreprocessConfig {
        mode,
        root_dir: PathBuf::from("/opt/avod"),
        ..PreprocessConfig::default()
    };
    for (name, job) in config.datasets.iter_mut() {
        match enabled.iter().find(|(enabled_name, _)| enabled_name == name) {
            Some((_, workers)) => {
                job.enabled = true;
                job.worker_count = *workers;
            }
            None => job.enabled = false,
        }
    }
    config
}

#[tokio::test]
async fn test_parallel_run_splits_every_enabled_dataset() {
    let loader = Arc::new(
        MockLoader::default()
            .with("cars.config", MockDataset::new("cars", 10))
            .with("person.config", MockDataset::new("person", 8)),
    );
    let driver = PreprocessDriver::new(loader.clone());
    let config = config_for(ExecutionMode::Parallel, &[("person", 2), ("cars", 4)]);

    let report = driver.run(&config).await.unwrap();

    assert_eq!(report.mode, ExecutionMode::Parallel);
    assert_eq!(report.worker_count(), 6);
    assert!(report.all_succeeded());

    // Menu order: cars before person
    let datasets: Vec<&str> = report.outcomes.iter().map(|o| o.dataset.as_str()).collect();
    assert_eq!(datasets, vec!["cars", "cars", "cars", "cars", "person", "person"]);

    let mut car_calls: Vec<Vec<usize>> = loader
        .dataset("cars.config")
        .calls()
        .into_iter()
        .map(Option::unwrap)
        .collect();
    car_calls.sort();
    assert_eq!(
        car_calls,
        vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]
    );

    let requested = loader.requested.lock().clone();
    assert_eq!(
        requested,
        vec![
            PathBuf::from("/opt/avod/configs/mb_preprocessing/cars/cars.config"),
            PathBuf::from("/opt/avod/configs/mb_preprocessing/person.config"),
        ]
    );
}

#[tokio::test]
async fn test_parallel_failures_are_reported_not_raised() {
    let loader = Arc::new(
        MockLoader::default()
            .with("cars.config", MockDataset::failing("cars", 4))
            .with("all.config", MockDataset::new("all", 4)),
    );
    let driver = PreprocessDriver::new(loader.clone());
    let config = config_for(ExecutionMode::Parallel, &[("cars", 2), ("all", 2)]);

    let report = driver.run(&config).await.unwrap();

    assert_eq!(report.worker_count(), 4);
    assert_eq!(report.failed_count(), 2);
    assert!(report
        .failed()
        .all(|o| o.dataset == "cars" && matches!(o.status, WorkerStatus::Failed { .. })));
    assert_eq!(loader.dataset("all.config").calls().len(), 2);
}

#[tokio::test]
async fn test_serial_run_processes_all_samples_in_process() {
    let loader = Arc::new(
        MockLoader::default()
            .with("cyclists.config", MockDataset::new("cyclists", 5))
            .with("all.config", MockDataset::new("all", 7)),
    );
    let driver = PreprocessDriver::new(loader.clone());
    let config = config_for(ExecutionMode::Serial, &[("cyclists", 8), ("all", 8)]);

    let report = driver.run(&config).await.unwrap();

    assert_eq!(report.worker_count(), 2);
    assert_eq!(report.outcomes[0].dataset, "cyclists");
    assert_eq!(report.outcomes[1].partition_len, 7);
    assert_eq!(loader.dataset("cyclists.config").calls(), vec![None]);
    assert_eq!(loader.dataset("all.config").calls(), vec![None]);
}

#[tokio::test]
async fn test_serial_failure_stops_the_run() {
    let loader = Arc::new(
        MockLoader::default()
            .with("cars.config", MockDataset::failing("cars", 3))
            .with("all.config", MockDataset::new("all", 3)),
    );
    let driver = PreprocessDriver::new(loader.clone());
    let config = config_for(ExecutionMode::Serial, &[("cars", 1), ("all", 1)]);

    let err = driver.run(&config).await.unwrap_err();

    assert!(matches!(err, PreprocessError::Preprocessing { .. }));
    assert!(loader.dataset("all.config").calls().is_empty());
}

#[tokio::test]
async fn test_serial_panic_is_returned_as_an_error() {
    let loader = Arc::new(
        MockLoader::default()
            .with("cars.config", MockDataset::panicking("cars", 3))
            .with("all.config", MockDataset::new("all", 3)),
    );
    let driver = PreprocessDriver::new(loader.clone());
    let config = config_for(ExecutionMode::Serial, &[("cars", 1), ("all", 1)]);

    let err = driver.run(&config).await.unwrap_err();

    match err {
        PreprocessError::WorkerPanicked {
            dataset,
            worker_index,
            message,
        } => {
            assert_eq!(dataset, "cars");
            assert_eq!(worker_index, 0);
            assert_eq!(message, "mock panic in cars");
        }
        other => panic!("expected WorkerPanicked, got {other:?}"),
    }
    assert!(loader.dataset("all.config").calls().is_empty());
}

#[tokio::test]
async fn test_missing_dataset_config_aborts_before_work() {
    let loader = Arc::new(MockLoader::default().with("cars.config", MockDataset::new("cars", 4)));
    let driver = PreprocessDriver::new(loader.clone());
    // "all" has no mock and fails to load after "cars" loaded
    let config = config_for(ExecutionMode::Parallel, &[("cars", 2), ("all", 2)]);

    let err = driver.run(&config).await.unwrap_err();

    assert!(matches!(err, PreprocessError::DatasetLoad { .. }));
    assert!(loader.dataset("cars.config").calls().is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let driver = PreprocessDriver::new(Arc::new(MockLoader::default()));
    let mut config = config_for(ExecutionMode::Parallel, &[("cars", 2)]);
    config.datasets.insert(
        "trucks".to_string(),
        DatasetJobConfig {
            enabled: true,
            worker_count: 0,
            config_path: PathBuf::from("trucks.config"),
        },
    );

    let err = driver.run(&config).await.unwrap_err();
    assert!(matches!(err, PreprocessError::Configuration { .. }));
}

#[tokio::test]
async fn test_nothing_enabled_is_an_empty_run() {
    let driver = PreprocessDriver::new(Arc::new(MockLoader::default()));
    let config = config_for(ExecutionMode::Parallel, &[]);

    let report = driver.run(&config).await.unwrap();
    assert_eq!(report.worker_count(), 0);
    assert!(report.all_succeeded());
}

#[tokio::test]
async fn test_process_single_dataset() {
    let dataset = Arc::new(MockDataset::new("people", 12));
    PreprocessDriver::process_dataset(dataset.clone()).await.unwrap();
    assert_eq!(dataset.calls(), vec![None]);

    let failing = Arc::new(MockDataset::failing("people", 12));
    assert!(PreprocessDriver::process_dataset(failing).await.is_err());

    let panicking = Arc::new(MockDataset::panicking("people", 12));
    let err = PreprocessDriver::process_dataset(panicking).await.unwrap_err();
    assert!(matches!(err, PreprocessError::WorkerPanicked { .. }));
}
