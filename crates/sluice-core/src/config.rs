//! Pipeline configuration.
//!
//! Configuration can be built in code, parsed from TOML, or loaded from a file,
//! and optionally overridden from the environment.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Environment variable overriding the configured batch size.
pub const BATCH_SIZE_ENV: &str = "SLUICE_BATCH_SIZE";

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of pending items that triggers a dispatch, and the maximum size
    /// of a dispatched batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Applies `SLUICE_BATCH_SIZE` if it is set.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        match std::env::var(BATCH_SIZE_ENV) {
            Ok(raw) => Ok(self.with_batch_size(parse_batch_size(&raw)?)),
            Err(_) => Ok(self),
        }
    }
}

/// Parses a batch size given as text, rejecting zero.
pub fn parse_batch_size(raw: &str) -> Result<usize, ConfigError> {
    let batch_size = raw
        .trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidValue(format!("batch size '{}': {}", raw, e)))?;
    if batch_size == 0 {
        return Err(ConfigError::InvalidValue("batch_size must be at least 1".to_string()));
    }
    Ok(batch_size)
}
