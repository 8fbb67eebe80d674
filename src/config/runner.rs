use crate::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for the standalone runner (not the logger itself)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Directory the logical storage paths are resolved under
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// How often the scheduler wakes the logger (in milliseconds)
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// tracing filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Report this many free bytes instead of querying the disk
    #[serde(default)]
    pub free_space_limit: Option<u64>,
}

// Default value functions for serde
fn default_root() -> PathBuf {
    PathBuf::from("./sensorlog")
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            tick_ms: default_tick_ms(),
            log_level: default_log_level(),
            free_space_limit: None,
        }
    }
}

impl RunnerConfig {
    /// Load runner settings from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<RunnerConfig> {
        let contents = std::fs::read_to_string(path)?;

        // Determine format based on file extension
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let config: RunnerConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| LoggerError::ConfigParse(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| LoggerError::ConfigParse(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(LoggerError::ConfigValidation(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(LoggerError::MissingConfigField("root".to_string()));
        }

        if self.tick_ms == 0 {
            return Err(LoggerError::ConfigValidation(
                "tick_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the tick interval as Duration
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
