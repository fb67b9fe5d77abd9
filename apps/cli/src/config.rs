//! CLI configuration loading and merging.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Environment variables (`SLUICE_BATCH_SIZE`)
//! 3. Config file (`--config <path>`, or `./sluice.toml` when present)
//! 4. Defaults

use serde::{Deserialize, Serialize};
use sluice_core::{ConfigError, PipelineConfig};
use std::path::Path;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sluice.toml";

/// CLI configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Loads the explicit config file, or `./sluice.toml` if it exists, then
    /// applies environment overrides.
    pub fn discover_and_load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() { Self::load_from_file(local)? } else { Self::default() }
            }
        };

        config.pipeline = config.pipeline.with_env_overrides()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\n[pipeline]\nbatch_size = 12").unwrap();
        file.flush().unwrap();

        let config = CliConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.pipeline.batch_size, 12);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();
        file.flush().unwrap();

        let config = CliConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_invalid_batch_size_in_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nbatch_size = 0").unwrap();
        file.flush().unwrap();

        assert!(matches!(CliConfig::load_from_file(file.path()), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = CliConfig::discover_and_load(Some(Path::new("/nonexistent/sluice.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_serializes_back_to_toml() {
        let config = CliConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[pipeline]"));
        assert!(rendered.contains("batch_size = 8"));
    }
}
