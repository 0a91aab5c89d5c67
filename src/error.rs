//! # Preprocessing Error Types
//!
//! Structured error handling for the index splitter, dataset loading and the
//! worker fan-out, using thiserror instead of `Box<dyn Error>` patterns.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Invalid worker count: {count} (must be at least 1)")]
    InvalidWorkerCount { count: usize },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Dataset load error: {path}: {message}")]
    DatasetLoad { path: String, message: String },

    #[error("Preprocessing error: {dataset}: {message}")]
    Preprocessing { dataset: String, message: String },

    #[error("Worker {worker_index} for {dataset} panicked: {message}")]
    WorkerPanicked {
        dataset: String,
        worker_index: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PreprocessError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn dataset_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DatasetLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn preprocessing(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Preprocessing {
            dataset: dataset.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for PreprocessError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PreprocessError>;
