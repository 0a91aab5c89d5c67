//! # Dataset Boundary
//!
//! The mini-batch driver does not know how anchors or mini-batches are
//! computed. It only needs a dataset that reports its sample count and can
//! preprocess a set of sample indices, writing results into its mini-batch
//! directory. [`MiniBatchDataset`] is that boundary and [`DatasetLoader`]
//! builds datasets from their config files.
//!
//! [`manifest`] provides the implementation used by the command line driver,
//! which hands each partition to an external preprocessing command.

pub mod manifest;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;

pub use manifest::{DatasetManifest, ManifestDataset, ManifestDatasetLoader};

/// A dataset whose RPN mini-batches can be preprocessed by sample index
#[async_trait]
pub trait MiniBatchDataset: Send + Sync + std::fmt::Debug {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Object classes covered by this dataset
    fn classes(&self) -> &[String];

    fn num_samples(&self) -> usize;

    /// Directory the preprocessing writes mini-batches into
    fn mini_batch_dir(&self) -> &Path;

    /// Preprocess the given sample indices; `None` means every sample.
    ///
    /// Implementations must tolerate concurrent calls with disjoint indices.
    async fn preprocess_rpn_mini_batches(&self, indices: Option<Vec<usize>>) -> Result<()>;
}

/// Builds datasets from dataset config files
pub trait DatasetLoader: Send + Sync {
    fn load_dataset_from_config(&self, path: &Path) -> Result<Arc<dyn MiniBatchDataset>>;
}

/// Run preprocessing for one dataset with start/finish logging
pub async fn run_preprocessing(
    dataset: &dyn MiniBatchDataset,
    indices: Option<Vec<usize>>,
) -> Result<()> {
    info!(
        dataset = %dataset.name(),
        mini_batch_dir = %dataset.mini_batch_dir().display(),
        sample_count = indices.as_ref().map_or(dataset.num_samples(), Vec::len),
        "Generating mini batches"
    );

    // Generating every mini-batch can take a long time
    dataset.preprocess_rpn_mini_batches(indices).await?;

    info!(dataset = %dataset.name(), "Mini batches generated");
    Ok(())
}
