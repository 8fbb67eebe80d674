// Logger module - Couples the settings and the sampling engine behind the host surface

use crate::actor::{Actor, Description, ACTION_ACK, LOG_NOW_ACTION};
use crate::clock::Clock;
use crate::config::{ConfigManager, LoggerConfig};
use crate::engine::{LoggingEngine, SampleOutcome};
use crate::error::{LoggerError, Result};
use crate::scheduler::PeriodicTask;
use crate::sensors::MeasurementSource;
use crate::storage::Storage;
use std::collections::BTreeMap;

/// Actor id the logger registers under
pub const LOGGER_ID: u32 = 1;

/// Actor type reported to the host
pub const LOGGER_TYPE: &str = "datalogger";

/// Periodic data logger writing sensor readings to a CSV file
pub struct DataLogger<S, M, C> {
    storage: S,
    sensors: M,
    clock: C,
    config: ConfigManager,
    engine: LoggingEngine,
}

impl<S, M, C> DataLogger<S, M, C>
where
    S: Storage,
    M: MeasurementSource,
    C: Clock,
{
    /// Create a logger using the default settings path and data directory
    pub fn new(storage: S, sensors: M, clock: C) -> Self {
        Self {
            storage,
            sensors,
            clock,
            config: ConfigManager::new(),
            engine: LoggingEngine::new(),
        }
    }

    /// Create a logger with custom settings path and data directory
    pub fn with_paths(storage: S, sensors: M, clock: C, config_path: &str, data_dir: &str) -> Self {
        Self {
            storage,
            sensors,
            clock,
            config: ConfigManager::with_config_path(config_path),
            engine: LoggingEngine::with_data_dir(data_dir),
        }
    }

    /// Load or create the settings and apply them
    ///
    /// Safe to call more than once. The engine is configured even when
    /// loading fails, using whatever settings are in effect.
    pub fn begin(&mut self) -> Result<()> {
        let result = self.config.bootstrap(&self.storage);
        self.apply_runtime();

        match result {
            Ok(config) => {
                tracing::info!(
                    "{} started (enabled: {}, period: {}ms, file: {})",
                    config.display_name,
                    config.enabled,
                    config.sampling_period_ms,
                    self.engine.resolved_path()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load logger settings: {}", e);
                Err(e)
            }
        }
    }

    /// Load the settings without touching storage
    ///
    /// Nothing is written, not even defaults or a data file header.
    pub fn load_settings(&mut self) -> Result<()> {
        let result = self.config.load(&self.storage);
        self.sync_engine();
        result.map(|_| ())
    }

    /// Current settings as JSON
    pub fn get_config(&self) -> Result<String> {
        self.config.serialize()
    }

    /// Replace the settings and reconfigure the engine
    ///
    /// On a parse or validation failure nothing changes. When `persist` is
    /// set and the save fails, the error is returned but the new settings
    /// remain in effect.
    pub fn set_config(&mut self, serialized: &str, persist: bool) -> Result<()> {
        self.config.update(serialized)?;
        self.apply_runtime();

        if persist {
            self.config.save(&self.storage)?;
        }

        Ok(())
    }

    /// Periodic entry point
    ///
    /// Returns `Ok(None)` when no sample was due.
    pub fn run_periodic(&mut self, elapsed_ms: u64) -> Result<Option<SampleOutcome>> {
        self.engine
            .tick(elapsed_ms, &self.storage, &mut self.sensors, &self.clock)
            .transpose()
    }

    /// Dispatch a host action
    ///
    /// Only [`LOG_NOW_ACTION`] is defined; it samples immediately.
    pub fn handle_action(&mut self, action: i32, payload: &str) -> Result<String> {
        match action {
            LOG_NOW_ACTION => {
                tracing::debug!("Log now requested (payload: {})", payload);
                self.engine
                    .trigger_action(&self.storage, &mut self.sensors, &self.clock)?;
                Ok(ACTION_ACK.to_string())
            }
            other => Err(LoggerError::UnknownAction(other)),
        }
    }

    /// Settings currently in effect
    pub fn config(&self) -> &LoggerConfig {
        self.config.config()
    }

    /// Absolute logical path of the data file
    pub fn data_path(&self) -> &str {
        self.engine.resolved_path()
    }

    pub fn engine(&self) -> &LoggingEngine {
        &self.engine
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Push the current settings into the engine
    fn sync_engine(&mut self) {
        let config = self.config.config();
        self.engine.configure(config);

        if self.engine.set_enabled(config.enabled) {
            tracing::info!(
                "Task {} {}",
                config.task_name(),
                if config.enabled { "enabled" } else { "disabled" }
            );
        }
    }

    /// Push the current settings into the engine and prepare the data file
    fn apply_runtime(&mut self) {
        self.sync_engine();

        // The header is created lazily; failing here only delays it to the next sample
        if self.engine.is_enabled() {
            let prepared = self
                .engine
                .ensure_data_file(&self.storage, &self.sensors)
                .map(|_| ());
            if let Err(e) = prepared {
                tracing::warn!(
                    "Could not prepare data file {}: {}",
                    self.engine.resolved_path(),
                    e
                );
            }
        }
    }
}

impl<S, M, C> Actor for DataLogger<S, M, C>
where
    S: Storage,
    M: MeasurementSource,
    C: Clock,
{
    fn description(&self) -> Description {
        let mut actions = BTreeMap::new();
        actions.insert(LOG_NOW_ACTION, "Log Now".to_string());

        Description {
            id: LOGGER_ID,
            name: self.config().display_name.clone(),
            kind: LOGGER_TYPE.to_string(),
            actions,
        }
    }

    fn get_config(&self) -> Result<String> {
        DataLogger::get_config(self)
    }

    fn set_config(&mut self, config: &str, persist: bool) -> Result<()> {
        DataLogger::set_config(self, config, persist)
    }

    fn receive_action(&mut self, action: i32, payload: &str) -> Result<String> {
        self.handle_action(action, payload)
    }
}

impl<S, M, C> PeriodicTask for DataLogger<S, M, C>
where
    S: Storage,
    M: MeasurementSource,
    C: Clock,
{
    fn task_name(&self) -> String {
        self.config().task_name()
    }

    fn is_task_enabled(&self) -> bool {
        self.engine.is_enabled()
    }

    fn run_task(&mut self, elapsed_ms: u64) {
        match self.run_periodic(elapsed_ms) {
            Ok(Some(SampleOutcome::Written { path, bytes })) => {
                tracing::debug!("Sample written to {} ({} bytes)", path, bytes);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Logging cycle failed: {}", e);
            }
        }
    }
}
