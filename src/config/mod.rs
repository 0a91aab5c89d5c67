//! # Preprocessing Configuration
//!
//! Explicit configuration for the mini-batch driver: execution mode, the root
//! directory dataset config paths are resolved against, and the menu of named
//! datasets with their enabled flag, worker count and config path.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mini_batch_fanout::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_file("config/mini_batches.toml")
//!     .load()?;
//!
//! for (name, job) in config.enabled_datasets() {
//!     println!("{name}: {} workers", job.worker_count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{datasets, DEFAULT_WORKER_COUNT};
use crate::error::{PreprocessError, Result};

pub use loader::ConfigLoader;

/// Serial runs every dataset in-process over all samples; parallel splits each
/// dataset across its workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Serial,
    Parallel,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Serial => write!(f, "serial"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// Settings for one named dataset
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatasetJobConfig {
    pub enabled: bool,
    pub worker_count: usize,
    /// Dataset config file, relative to `root_dir` unless absolute
    pub config_path: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PreprocessConfig {
    pub mode: ExecutionMode,
    pub root_dir: PathBuf,
    pub datasets: BTreeMap<String, DatasetJobConfig>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        let datasets = datasets::MENU
            .iter()
            .map(|(name, path, enabled)| {
                (
                    (*name).to_string(),
                    DatasetJobConfig {
                        enabled: *enabled,
                        worker_count: DEFAULT_WORKER_COUNT,
                        config_path: PathBuf::from(path),
                    },
                )
            })
            .collect();

        Self {
            mode: ExecutionMode::Parallel,
            root_dir: PathBuf::from("."),
            datasets,
        }
    }
}

impl PreprocessConfig {
    /// Enabled datasets in processing order: menu datasets first, in menu
    /// order, then any additional datasets by name
    pub fn enabled_datasets(&self) -> Vec<(&str, &DatasetJobConfig)> {
        let mut enabled: Vec<(&str, &DatasetJobConfig)> = self
            .datasets
            .iter()
            .filter(|(_, job)| job.enabled)
            .map(|(name, job)| (name.as_str(), job))
            .collect();

        enabled.sort_by_key(|(name, _)| {
            (
                datasets::menu_position(name).unwrap_or(usize::MAX),
                name.to_string(),
            )
        });
        enabled
    }

    /// Resolve a dataset config path against `root_dir`
    pub fn resolve_config_path(&self, job: &DatasetJobConfig) -> PathBuf {
        resolve_against(&self.root_dir, &job.config_path)
    }

    /// Restrict the run to the named datasets, enabling exactly those
    pub fn restrict_to(&mut self, names: &[String]) -> Result<()> {
        if let Some(unknown) = names.iter().find(|n| !self.datasets.contains_key(*n)) {
            return Err(PreprocessError::configuration(format!(
                "unknown dataset '{unknown}' (known: {})",
                self.datasets.keys().cloned().collect::<Vec<_>>().join(", ")
            )));
        }

        for (name, job) in self.datasets.iter_mut() {
            job.enabled = names.contains(name);
        }
        Ok(())
    }

    /// Override the worker count of every dataset
    pub fn set_worker_count(&mut self, worker_count: usize) {
        for job in self.datasets.values_mut() {
            job.worker_count = worker_count;
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, job) in &self.datasets {
            if name.trim().is_empty() {
                return Err(PreprocessError::configuration(
                    "dataset names must not be empty",
                ));
            }

            if !job.enabled {
                continue;
            }

            if job.worker_count == 0 {
                return Err(PreprocessError::configuration(format!(
                    "datasets.{name}.worker_count must be greater than 0"
                )));
            }

            if job.config_path.as_os_str().is_empty() {
                return Err(PreprocessError::configuration(format!(
                    "datasets.{name}.config_path must not be empty"
                )));
            }
        }

        Ok(())
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
