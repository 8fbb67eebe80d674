// Config module - Persisted logger settings and the runner configuration

mod runner;

pub use runner::RunnerConfig;

use crate::clock::{is_valid_date_format, DEFAULT_DATE_FORMAT};
use crate::error::{LoggerError, Result};
use crate::storage::{parent_dir, Storage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where the settings document lives in storage
pub const CONFIG_PATH: &str = "/settings/act/LocalLogger.json";

/// Logger settings persisted as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Data file name inside the data directory
    #[serde(alias = "name")]
    pub file_name: String,

    /// Whether periodic sampling is active
    pub enabled: bool,

    /// Interval between rows (in milliseconds)
    #[serde(rename = "samplingPeriod")]
    pub sampling_period_ms: u64,

    /// Human-readable logger name
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// strftime pattern for the timestamp column
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

// Default value functions for serde
fn default_file_name() -> String {
    "LocalData.csv".to_string()
}

fn default_sampling_period() -> u64 {
    10_000
}

fn default_display_name() -> String {
    "Local Data Logger".to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            enabled: false,
            sampling_period_ms: default_sampling_period(),
            display_name: default_display_name(),
            date_format: default_date_format(),
        }
    }
}

impl LoggerConfig {
    /// Name of the scheduling task, derived from the display name
    pub fn task_name(&self) -> String {
        self.display_name.split_whitespace().collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(LoggerError::MissingConfigField("fileName".to_string()));
        }

        if self.file_name.contains('/')
            || self.file_name.contains('\\')
            || self.file_name == "."
            || self.file_name == ".."
        {
            return Err(LoggerError::ConfigValidation(format!(
                "fileName must be a plain file name: {}",
                self.file_name
            )));
        }

        if self.display_name.trim().is_empty() {
            return Err(LoggerError::ConfigValidation(
                "displayName cannot be empty".to_string(),
            ));
        }

        if !is_valid_date_format(&self.date_format) {
            return Err(LoggerError::ConfigValidation(format!(
                "Invalid dateFormat: {}",
                self.date_format
            )));
        }

        Ok(())
    }

    /// Parse a settings document on top of this configuration
    ///
    /// `fileName`, `enabled` and `samplingPeriod` are required; the
    /// optional fields keep their current value when absent. The result is
    /// validated but `self` is left untouched.
    pub fn merged_with(&self, serialized: &str) -> Result<LoggerConfig> {
        let value: Value = serde_json::from_str(serialized)
            .map_err(|e| LoggerError::ConfigParse(format!("Failed to parse JSON: {}", e)))?;

        let object = value.as_object().ok_or_else(|| {
            LoggerError::ConfigParse("Settings must be a JSON object".to_string())
        })?;

        if !object.contains_key("fileName") && !object.contains_key("name") {
            return Err(LoggerError::MissingConfigField("fileName".to_string()));
        }
        for field in ["enabled", "samplingPeriod"] {
            if !object.contains_key(field) {
                return Err(LoggerError::MissingConfigField(field.to_string()));
            }
        }

        let mut object = object.clone();
        if !object.contains_key("displayName") {
            object.insert("displayName".to_string(), Value::from(self.display_name.clone()));
        }
        if !object.contains_key("dateFormat") {
            object.insert("dateFormat".to_string(), Value::from(self.date_format.clone()));
        }

        let merged: LoggerConfig = serde_json::from_value(Value::Object(object))
            .map_err(|e| LoggerError::ConfigParse(format!("Invalid settings: {}", e)))?;

        merged.validate()?;
        Ok(merged)
    }
}

/// Owns the current logger settings and their persisted form
pub struct ConfigManager {
    /// Storage path of the settings document
    config_path: String,
    /// Settings in effect for this process
    current: LoggerConfig,
}

impl ConfigManager {
    /// Create a manager with default settings and the default path
    pub fn new() -> Self {
        Self::with_config_path(CONFIG_PATH)
    }

    /// Create a manager persisting to a custom path
    pub fn with_config_path(config_path: &str) -> Self {
        Self {
            config_path: config_path.to_string(),
            current: LoggerConfig::default(),
        }
    }

    /// Settings currently in effect
    pub fn config(&self) -> &LoggerConfig {
        &self.current
    }

    /// Get the path of the settings document
    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    /// Load the persisted settings, creating them on first run
    ///
    /// Without a settings document the defaults are written out and the
    /// outcome of that write is returned. An existing document that cannot
    /// be parsed is reported rather than replaced with defaults.
    pub fn bootstrap(&mut self, storage: &dyn Storage) -> Result<LoggerConfig> {
        if !storage.file_exists(&self.config_path) {
            tracing::info!(
                "No settings at {}, writing defaults",
                self.config_path
            );
            self.current = LoggerConfig::default();
            self.save(storage)?;
        } else {
            let serialized = storage.read_file(&self.config_path)?;
            self.apply_config(storage, &serialized, false)?;
            tracing::info!("Loaded settings from {}", self.config_path);
        }

        Ok(self.current.clone())
    }

    /// Read the persisted settings without creating anything
    ///
    /// A missing settings file leaves the current settings in effect.
    pub fn load(&mut self, storage: &dyn Storage) -> Result<LoggerConfig> {
        if storage.file_exists(&self.config_path) {
            let serialized = storage.read_file(&self.config_path)?;
            self.apply_config(storage, &serialized, false)?;
        }

        Ok(self.current.clone())
    }

    /// Parse and apply a settings document, optionally persisting it
    ///
    /// Parse or validation failures leave the current settings untouched.
    /// A failed save is reported, but the new settings stay in effect.
    pub fn apply_config(
        &mut self,
        storage: &dyn Storage,
        serialized: &str,
        persist: bool,
    ) -> Result<()> {
        self.update(serialized)?;

        if persist {
            self.save(storage)?;
        }

        Ok(())
    }

    /// Parse a settings document and make it current, without persisting
    pub fn update(&mut self, serialized: &str) -> Result<&LoggerConfig> {
        let merged = self.current.merged_with(serialized).map_err(|e| {
            tracing::warn!("Rejected settings: {}", e);
            e
        })?;

        self.current = merged;
        Ok(&self.current)
    }

    /// Canonical JSON form of the current settings
    pub fn serialize(&self) -> Result<String> {
        serde_json::to_string(&self.current)
            .map_err(|e| LoggerError::Other(format!("Failed to serialize settings: {}", e)))
    }

    /// Write the current settings to storage
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let serialized = self.serialize()?;

        if let Some(dir) = parent_dir(&self.config_path) {
            if !storage.file_exists(dir) {
                storage.create_dir(dir)?;
            }
        }

        storage.write_file(&self.config_path, &serialized).map_err(|e| {
            tracing::error!("Failed to save settings to {}: {}", self.config_path, e);
            e
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
