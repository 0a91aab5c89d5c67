//! Configuration Loader
//!
//! Layers built-in defaults, an optional configuration file and environment
//! overrides into a validated [`PreprocessConfig`].

use std::path::{Path, PathBuf};
use tracing::debug;

use super::PreprocessConfig;
use crate::constants::{ENV_PREFIX, ENV_SEPARATOR};
use crate::error::{PreprocessError, Result};

/// Builder-style loader for [`PreprocessConfig`]
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_environment: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            use_environment: true,
        }
    }

    /// Layer a configuration file (TOML, YAML or JSON, chosen by extension)
    /// over the defaults
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Whether `MINI_BATCH__*` environment variables are applied last
    pub fn with_environment(mut self, enabled: bool) -> Self {
        self.use_environment = enabled;
        self
    }

    /// Load and validate the configuration
    pub fn load(&self) -> Result<PreprocessConfig> {
        let defaults = config::Config::try_from(&PreprocessConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = &self.file {
            Self::check_file(path)?;
            debug!("Loading configuration file: {}", path.display());
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        if self.use_environment {
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );
        }

        let config: PreprocessConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string(&config).unwrap_or_else(|_| "[serialization error]".to_string())
        );

        Ok(config)
    }

    fn check_file(path: &Path) -> Result<()> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            PreprocessError::configuration(format!(
                "cannot read configuration file {}: {e}",
                path.display()
            ))
        })?;

        if !metadata.is_file() {
            return Err(PreprocessError::configuration(format!(
                "configuration path {} is not a regular file",
                path.display()
            )));
        }

        Ok(())
    }
}
