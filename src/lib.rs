#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Mini-batch Fan-out
//!
//! Parallel driver for RPN mini-batch preprocessing of 3D object-detection
//! datasets.
//!
//! ## Overview
//!
//! Generating mini-batches for every sample of a dataset is slow, and each
//! sample is independent. The driver splits a dataset's sample indices into
//! one partition per worker, runs the preprocessing for every partition
//! concurrently and joins the workers, reporting each one's outcome. The
//! preprocessing itself lives behind the [`dataset::MiniBatchDataset`] trait.
//!
//! ## Module Organization
//!
//! - [`partition`] - Even splitting of `[0, num_samples)` with padding
//! - [`orchestration`] - Worker fan-out/join, serial/parallel driver, run report
//! - [`dataset`] - Dataset boundary and the command-backed manifest dataset
//! - [`config`] - Layered configuration of the named dataset menu
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mini_batch_fanout::config::ConfigLoader;
//! use mini_batch_fanout::dataset::ManifestDatasetLoader;
//! use mini_batch_fanout::orchestration::PreprocessDriver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().with_file("mini_batches.toml").load()?;
//! let driver = PreprocessDriver::new(Arc::new(ManifestDatasetLoader));
//!
//! let report = driver.run(&config).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod orchestration;
pub mod partition;

pub use config::{ConfigLoader, DatasetJobConfig, ExecutionMode, PreprocessConfig};
pub use dataset::{DatasetLoader, MiniBatchDataset};
pub use error::{PreprocessError, Result};
pub use orchestration::{
    fan_out, FanOut, FanOutReport, PreprocessDriver, WorkerOutcome, WorkerStatus,
};
pub use partition::{split_indices, Partition, PartitionPlan};
