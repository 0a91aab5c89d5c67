//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use mini_batch_fanout::dataset::{DatasetLoader, MiniBatchDataset};
use mini_batch_fanout::error::{PreprocessError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory dataset that records which indices it was asked to preprocess
#[derive(Debug)]
pub struct MockDataset {
    pub name: String,
    pub classes: Vec<String>,
    pub num_samples: usize,
    pub mini_batch_dir: PathBuf,
    pub fail: bool,
    pub panic: bool,
    pub calls: Mutex<Vec<Option<Vec<usize>>>>,
}

impl MockDataset {
    pub fn new(name: &str, num_samples: usize) -> Self {
        Self {
            name: name.to_string(),
            classes: vec![name.to_string()],
            num_samples,
            mini_batch_dir: PathBuf::from("/tmp/mini_batches").join(name),
            fail: false,
            panic: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str, num_samples: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(name, num_samples)
        }
    }

    pub fn panicking(name: &str, num_samples: usize) -> Self {
        Self {
            panic: true,
            ..Self::new(name, num_samples)
        }
    }

    pub fn calls(&self) -> Vec<Option<Vec<usize>>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MiniBatchDataset for MockDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn num_samples(&self) -> usize {
        self.num_samples
    }

    fn mini_batch_dir(&self) -> &Path {
        &self.mini_batch_dir
    }

    async fn preprocess_rpn_mini_batches(&self, indices: Option<Vec<usize>>) -> Result<()> {
        self.calls.lock().push(indices);
        if self.panic {
            panic!("mock panic in {}", self.name);
        }
        if self.fail {
            return Err(PreprocessError::preprocessing(&self.name, "mock failure"));
        }
        Ok(())
    }
}

/// Loader that serves pre-built mock datasets keyed by config file name
#[derive(Default)]
pub struct MockLoader {
    datasets: HashMap<String, Arc<MockDataset>>,
    pub requested: Mutex<Vec<PathBuf>>,
}

impl MockLoader {
    pub fn with(mut self, file_name: &str, dataset: MockDataset) -> Self {
        self.datasets.insert(file_name.to_string(), Arc::new(dataset));
        self
    }

    pub fn dataset(&self, file_name: &str) -> Arc<MockDataset> {
        self.datasets[file_name].clone()
    }
}

impl DatasetLoader for MockLoader {
    fn load_dataset_from_config(&self, path: &Path) -> Result<Arc<dyn MiniBatchDataset>> {
        self.requested.lock().push(path.to_path_buf());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match self.datasets.get(&file_name) {
            Some(dataset) => Ok(dataset.clone() as Arc<dyn MiniBatchDataset>),
            None => Err(PreprocessError::dataset_load(
                path.display().to_string(),
                "no such dataset config",
            )),
        }
    }
}
