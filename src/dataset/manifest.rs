//! # Manifest Datasets
//!
//! A dataset described by a small config file that names its classes, sample
//! count, mini-batch directory and the external command that generates
//! mini-batches. Each preprocessing call runs that command as a child process;
//! partitions are passed as `--indices 0,1,2`, or as `--indices-file <path>`
//! (one index per line) when the list is too long for a single argument.
//!
//! ```toml
//! name = "cars"
//! classes = ["Car"]
//! num_samples = 3712
//! mini_batch_dir = "mini_batches/cars"
//! command = ["python", "-m", "avod.preprocess_mini_batches", "--dataset", "cars"]
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DatasetLoader, MiniBatchDataset};
use crate::constants::{command_env, INDICES_FILE_FLAG, INDICES_FLAG, MAX_INLINE_INDICES_LEN};
use crate::error::{PreprocessError, Result};

/// Contents of a dataset config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatasetManifest {
    pub name: String,
    #[serde(default)]
    pub classes: Vec<String>,
    pub num_samples: usize,
    /// Relative paths are resolved against the manifest's directory
    pub mini_batch_dir: PathBuf,
    /// Program followed by its arguments
    pub command: Vec<String>,
}

impl DatasetManifest {
    /// Read a manifest; the format follows the file extension and defaults to TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let path_str = path.to_string_lossy().to_string();

        if !path.is_file() {
            return Err(PreprocessError::dataset_load(
                &path_str,
                "dataset config file not found",
            ));
        }

        let source = config::File::new(&path_str, Self::format_for(path)).required(true);
        let mut manifest: DatasetManifest = config::Config::builder()
            .add_source(source)
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| PreprocessError::dataset_load(&path_str, e.to_string()))?;

        manifest.validate(&path_str)?;

        if manifest.mini_batch_dir.is_relative() {
            if let Some(parent) = path.parent() {
                manifest.mini_batch_dir = parent.join(&manifest.mini_batch_dir);
            }
        }

        Ok(manifest)
    }

    fn format_for(path: &Path) -> config::FileFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => config::FileFormat::Json,
            Some("yaml") | Some("yml") => config::FileFormat::Yaml,
            _ => config::FileFormat::Toml,
        }
    }

    fn validate(&self, path: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PreprocessError::dataset_load(path, "name must not be empty"));
        }
        if self.command.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(PreprocessError::dataset_load(
                path,
                "command must name a program",
            ));
        }
        Ok(())
    }
}

/// Dataset that delegates preprocessing to an external command
#[derive(Debug, Clone)]
pub struct ManifestDataset {
    manifest: DatasetManifest,
}

impl ManifestDataset {
    pub fn new(manifest: DatasetManifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &DatasetManifest {
        &self.manifest
    }

    /// Build the command for a preprocessing call
    fn build_command(&self, indices: Option<&IndicesArg>) -> Command {
        let mut command = Command::new(&self.manifest.command[0]);
        command
            .args(&self.manifest.command[1..])
            .env(command_env::MINI_BATCH_DIR, &self.manifest.mini_batch_dir)
            .env(command_env::MINI_BATCH_DATASET, &self.manifest.name);

        match indices {
            Some(IndicesArg::Inline(joined)) => {
                command.arg(INDICES_FLAG).arg(joined);
            }
            Some(IndicesArg::File(path)) => {
                command.arg(INDICES_FILE_FLAG).arg(path);
            }
            None => {}
        }

        command
    }

    async fn run_command(&self, indices: Option<&IndicesArg>) -> Result<()> {
        let mut command = self.build_command(indices);
        debug!(dataset = %self.manifest.name, command = ?command, "Spawning preprocessing command");

        let status = command.status().await.map_err(|e| {
            PreprocessError::preprocessing(
                &self.manifest.name,
                format!("failed to start '{}': {e}", self.manifest.command[0]),
            )
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(PreprocessError::preprocessing(
                &self.manifest.name,
                format!("preprocessing command exited with {status}"),
            ))
        }
    }
}

/// How a partition reaches the preprocessing command
#[derive(Debug, Clone, PartialEq, Eq)]
enum IndicesArg {
    Inline(String),
    File(PathBuf),
}

impl IndicesArg {
    /// Inline short partitions; spill long ones to a temporary file
    async fn prepare(dataset: &str, indices: &[usize]) -> Result<Self> {
        let joined = join_indices(indices);
        if joined.len() <= MAX_INLINE_INDICES_LEN {
            return Ok(Self::Inline(joined));
        }

        let path =
            std::env::temp_dir().join(format!("mini-batch-indices-{}.txt", Uuid::new_v4()));
        let mut contents = joined.replace(',', "\n");
        contents.push('\n');
        tokio::fs::write(&path, contents).await.map_err(|e| {
            PreprocessError::preprocessing(
                dataset,
                format!("failed to write indices file {}: {e}", path.display()),
            )
        })?;

        debug!(
            dataset = %dataset,
            indices = indices.len(),
            path = %path.display(),
            "Passing partition through an indices file"
        );
        Ok(Self::File(path))
    }

    async fn cleanup(&self) {
        if let Self::File(path) = self {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove indices file");
            }
        }
    }
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl MiniBatchDataset for ManifestDataset {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn classes(&self) -> &[String] {
        &self.manifest.classes
    }

    fn num_samples(&self) -> usize {
        self.manifest.num_samples
    }

    fn mini_batch_dir(&self) -> &Path {
        &self.manifest.mini_batch_dir
    }

    async fn preprocess_rpn_mini_batches(&self, indices: Option<Vec<usize>>) -> Result<()> {
        let Some(indices) = indices else {
            return self.run_command(None).await;
        };

        let arg = IndicesArg::prepare(&self.manifest.name, &indices).await?;
        let result = self.run_command(Some(&arg)).await;
        arg.cleanup().await;
        result
    }
}

/// Loads [`ManifestDataset`]s from dataset config files
#[derive(Debug, Clone, Default)]
pub struct ManifestDatasetLoader;

impl DatasetLoader for ManifestDatasetLoader {
    fn load_dataset_from_config(&self, path: &Path) -> Result<Arc<dyn MiniBatchDataset>> {
        let manifest = DatasetManifest::from_file(path)?;
        debug!(
            dataset = %manifest.name,
            num_samples = manifest.num_samples,
            "Loaded dataset manifest from {}",
            path.display()
        );
        Ok(Arc::new(ManifestDataset::new(manifest)))
    }
}
