// Engine module - Periodic sampling and the CSV write path

mod schema;

pub use schema::{format_row, FrozenSchema, TIME_COLUMN};

use crate::clock::{Clock, DEFAULT_DATE_FORMAT};
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use crate::scheduler::PeriodicTrigger;
use crate::sensors::{MeasurementSet, MeasurementSource};
use crate::storage::{join_path, Storage};

/// Directory data files are created in
pub const DATA_DIR: &str = "/data";

/// Result of one sample attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// The row was appended to the data file
    Written { path: String, bytes: usize },
    /// Not enough free space; the row was discarded
    Dropped { needed: u64, available: u64 },
}

/// Periodic sampler writing one CSV row per period
///
/// Holds only runtime state; the persisted settings live in the
/// config manager and are pushed in through [`LoggingEngine::configure`].
#[derive(Debug)]
pub struct LoggingEngine {
    /// Directory holding the data files
    data_dir: String,
    /// `data_dir/file_name`
    resolved_path: String,
    /// Interval between rows
    sampling_period_ms: u64,
    /// Pattern for the timestamp column
    date_format: String,
    /// Whether the host should invoke the periodic entry point
    enabled: bool,
    /// Elapsed-time accumulator
    trigger: PeriodicTrigger,
    /// Column layout of the file at `resolved_path`, once known
    schema: Option<FrozenSchema>,
}

impl LoggingEngine {
    /// Create an engine writing under the default data directory
    pub fn new() -> Self {
        Self::with_data_dir(DATA_DIR)
    }

    /// Create an engine writing under a custom data directory
    pub fn with_data_dir(data_dir: &str) -> Self {
        let defaults = LoggerConfig::default();
        Self {
            data_dir: data_dir.to_string(),
            resolved_path: join_path(data_dir, &defaults.file_name),
            sampling_period_ms: defaults.sampling_period_ms,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            enabled: false,
            trigger: PeriodicTrigger::new(),
            schema: None,
        }
    }

    /// Apply file identity, period and date format from the settings
    ///
    /// A new file name invalidates the cached schema, since it belongs
    /// to the previous file.
    pub fn configure(&mut self, config: &LoggerConfig) {
        let path = join_path(&self.data_dir, &config.file_name);
        if path != self.resolved_path {
            tracing::debug!("Data file changed: {} -> {}", self.resolved_path, path);
            self.resolved_path = path;
            self.schema = None;
        }

        self.sampling_period_ms = config.sampling_period_ms;
        self.date_format = config.date_format.clone();
    }

    /// Enable or disable periodic sampling
    ///
    /// Enabling restarts the elapsed-time count, so the transition itself
    /// never produces a row. Returns true if the state changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }

        self.enabled = enabled;
        if enabled {
            self.trigger.reset();
        }
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Absolute logical path of the data file
    pub fn resolved_path(&self) -> &str {
        &self.resolved_path
    }

    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    pub fn sampling_period_ms(&self) -> u64 {
        self.sampling_period_ms
    }

    /// Column layout of the current data file, if it has been established
    pub fn schema(&self) -> Option<&FrozenSchema> {
        self.schema.as_ref()
    }

    /// Periodic entry point
    ///
    /// Returns `None` while disabled or before the period has elapsed.
    /// Once due, exactly one sample is attempted and the accumulator is
    /// reset whatever the outcome.
    pub fn tick(
        &mut self,
        elapsed_ms: u64,
        storage: &dyn Storage,
        sensors: &mut dyn MeasurementSource,
        clock: &dyn Clock,
    ) -> Option<Result<SampleOutcome>> {
        if !self.enabled {
            return None;
        }

        if !self.trigger.advance(elapsed_ms, self.sampling_period_ms) {
            return None;
        }

        Some(self.sample_and_append(storage, sensors, clock))
    }

    /// Create the data file with its header if it is missing or empty
    ///
    /// The header is derived from the sensor metadata at most once per file.
    /// For an existing file the schema is read back from its header line
    /// instead, whatever the sensors currently report.
    pub fn ensure_data_file(
        &mut self,
        storage: &dyn Storage,
        sensors: &dyn MeasurementSource,
    ) -> Result<&FrozenSchema> {
        if self.schema.is_none() && storage.file_exists(&self.resolved_path) {
            if let Some(line) = storage.read_first_line(&self.resolved_path)? {
                self.schema = Some(FrozenSchema::from_header_line(&line)?);
            }
        }

        // A missing or zero-length file gets a fresh header
        if self.schema.is_none() || !storage.file_exists(&self.resolved_path) {
            let schema = FrozenSchema::from_sensor_info(&sensors.sensor_info())?;

            if !storage.file_exists(&self.data_dir) {
                storage.create_dir(&self.data_dir)?;
            }
            storage.write_file(&self.resolved_path, &schema.header_line())?;

            tracing::info!(
                "Created data file {} with {} column(s)",
                self.resolved_path,
                schema.len()
            );
            self.schema = Some(schema);
        }

        self.schema
            .as_ref()
            .ok_or_else(|| LoggerError::Other("Data file schema unavailable".to_string()))
    }

    /// Take one sample and append it as a row
    ///
    /// The row is written only if the storage reports strictly more free
    /// bytes than the row occupies; otherwise it is dropped.
    pub fn sample_and_append(
        &mut self,
        storage: &dyn Storage,
        sensors: &mut dyn MeasurementSource,
        clock: &dyn Clock,
    ) -> Result<SampleOutcome> {
        let expected = self.ensure_data_file(storage, &*sensors)?.len();

        let timestamp = clock.format_now(&self.date_format);
        let values = MeasurementSet::parse(&sensors.latest_measurements())?.cells()?;

        if values.len() != expected {
            return Err(LoggerError::SchemaMismatch {
                expected,
                found: values.len(),
            });
        }

        let row = format_row(&timestamp, &values);

        let available = storage.free_space()?;
        if let Err(e) = ensure_capacity(available, row.len()) {
            tracing::warn!("Dropping row for {}: {}", self.resolved_path, e);
            return Ok(SampleOutcome::Dropped {
                needed: row.len() as u64,
                available,
            });
        }

        storage.append_to_file(&self.resolved_path, &row)?;
        tracing::debug!("Logged {} bytes to {}", row.len(), self.resolved_path);

        Ok(SampleOutcome::Written {
            path: self.resolved_path.clone(),
            bytes: row.len(),
        })
    }

    /// Sample immediately, ignoring the elapsed-time check
    pub fn trigger_action(
        &mut self,
        storage: &dyn Storage,
        sensors: &mut dyn MeasurementSource,
        clock: &dyn Clock,
    ) -> Result<SampleOutcome> {
        tracing::debug!("Immediate sample requested for {}", self.resolved_path);
        self.sample_and_append(storage, sensors, clock)
    }
}

impl Default for LoggingEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A row fits only if free space strictly exceeds its length
fn ensure_capacity(available: u64, row_len: usize) -> Result<()> {
    let needed = row_len as u64;
    if available > needed {
        Ok(())
    } else {
        Err(LoggerError::InsufficientSpace { needed, available })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStorage;
    use tempfile::TempDir;

    struct StaticSensors {
        info: String,
        measurements: String,
    }

    impl StaticSensors {
        fn new(info: &str, measurements: &str) -> Self {
            Self {
                info: info.to_string(),
                measurements: measurements.to_string(),
            }
        }

        fn temperature() -> Self {
            Self::new(
                r#"{"sensors":[{"parameters":[{"name":"temp","unit":"C"}]}]}"#,
                r#"{"measurements":[{"value":"21.5"}]}"#,
            )
        }
    }

    impl MeasurementSource for StaticSensors {
        fn sensor_info(&self) -> String {
            self.info.clone()
        }

        fn latest_measurements(&mut self) -> String {
            self.measurements.clone()
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn format_now(&self, _pattern: &str) -> String {
            "01-01-2024 00:00:00".to_string()
        }
    }

    fn enabled_engine(period_ms: u64) -> LoggingEngine {
        let mut engine = LoggingEngine::new();
        engine.configure(&LoggerConfig {
            sampling_period_ms: period_ms,
            ..LoggerConfig::default()
        });
        engine.set_enabled(true);
        engine
    }

    #[test]
    fn test_resolved_path_follows_file_name() {
        let mut engine = LoggingEngine::new();
        assert_eq!(engine.resolved_path(), "/data/LocalData.csv");

        engine.configure(&LoggerConfig {
            file_name: "greenhouse.csv".to_string(),
            ..LoggerConfig::default()
        });
        assert_eq!(engine.resolved_path(), "/data/greenhouse.csv");
    }

    #[test]
    fn test_ensure_data_file_writes_header_once() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut engine = LoggingEngine::new();

        let sensors = StaticSensors::temperature();
        engine.ensure_data_file(&storage, &sensors).unwrap();

        // Schema source changes after the file exists
        let changed = StaticSensors::new(
            r#"{"sensors":[{"parameters":[{"name":"temp","unit":"C"},{"name":"rh","unit":"%"}]}]}"#,
            "",
        );
        let schema = engine.ensure_data_file(&storage, &changed).unwrap().clone();

        assert_eq!(schema.columns(), &["temp (C)".to_string()]);
        assert_eq!(
            storage.read_file("/data/LocalData.csv").unwrap(),
            "time,temp (C)\n"
        );
    }

    #[test]
    fn test_ensure_data_file_reads_existing_header() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        storage.create_dir("/data").unwrap();
        storage
            .write_file("/data/LocalData.csv", "time,a (V),b (V)\n1,2,3\n")
            .unwrap();

        let mut engine = LoggingEngine::new();
        let sensors = StaticSensors::temperature();
        let schema = engine.ensure_data_file(&storage, &sensors).unwrap();

        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_ensure_data_file_fills_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        storage.create_dir("/data").unwrap();
        storage.write_file("/data/LocalData.csv", "").unwrap();

        let mut sensors = StaticSensors::temperature();
        let mut engine = enabled_engine(0);

        for _ in 0..2 {
            engine
                .sample_and_append(&storage, &mut sensors, &FixedClock)
                .unwrap();
        }

        assert_eq!(
            storage.read_file("/data/LocalData.csv").unwrap(),
            "time,temp (C)\n01-01-2024 00:00:00,21.5\n01-01-2024 00:00:00,21.5\n"
        );
    }

    #[test]
    fn test_delimiter_in_value_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut sensors = StaticSensors::new(
            r#"{"sensors":[{"parameters":[{"name":"status","unit":"-"}]}]}"#,
            r#"{"measurements":[{"value":"ok\nbad"}]}"#,
        );
        let mut engine = enabled_engine(0);

        let result = engine.sample_and_append(&storage, &mut sensors, &FixedClock);
        assert!(matches!(result, Err(LoggerError::ConfigParse(_))));
        assert_eq!(
            storage.read_file("/data/LocalData.csv").unwrap(),
            "time,status (-)\n"
        );
    }

    #[test]
    fn test_ensure_data_file_malformed_schema_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut engine = LoggingEngine::new();

        let broken = StaticSensors::new(r#"{"sensors":[{"params":[]}]}"#, "");
        let result = engine.ensure_data_file(&storage, &broken);

        assert!(matches!(result, Err(LoggerError::Schema(_))));
        assert!(!storage.file_exists("/data/LocalData.csv"));
        assert!(engine.schema().is_none());
    }

    #[test]
    fn test_tick_waits_for_period() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut sensors = StaticSensors::temperature();
        let mut engine = enabled_engine(1000);

        assert!(engine.tick(500, &storage, &mut sensors, &FixedClock).is_none());
        assert!(!storage.file_exists("/data/LocalData.csv"));

        let outcome = engine
            .tick(500, &storage, &mut sensors, &FixedClock)
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, SampleOutcome::Written { bytes: 25, .. }));
        assert_eq!(
            storage.read_file("/data/LocalData.csv").unwrap(),
            "time,temp (C)\n01-01-2024 00:00:00,21.5\n"
        );
    }

    #[test]
    fn test_tick_disabled_does_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut sensors = StaticSensors::temperature();
        let mut engine = LoggingEngine::new();

        assert!(engine.tick(60_000, &storage, &mut sensors, &FixedClock).is_none());
        assert!(!storage.file_exists("/data/LocalData.csv"));
    }

    #[test]
    fn test_row_dropped_without_space() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(0);
        let mut sensors = StaticSensors::temperature();
        let mut engine = enabled_engine(0);

        let outcome = engine
            .sample_and_append(&storage, &mut sensors, &FixedClock)
            .unwrap();

        assert_eq!(outcome, SampleOutcome::Dropped { needed: 25, available: 0 });
        assert_eq!(
            storage.read_file("/data/LocalData.csv").unwrap(),
            "time,temp (C)\n"
        );
    }

    #[test]
    fn test_free_space_must_exceed_row_length() {
        let temp_dir = TempDir::new().unwrap();
        let mut sensors = StaticSensors::temperature();
        let mut engine = enabled_engine(0);

        // "01-01-2024 00:00:00,21.5\n" is 25 bytes
        let exact = FsStorage::new(temp_dir.path()).with_free_space(25);
        let outcome = engine
            .sample_and_append(&exact, &mut sensors, &FixedClock)
            .unwrap();
        assert!(matches!(outcome, SampleOutcome::Dropped { .. }));

        let roomy = FsStorage::new(temp_dir.path()).with_free_space(26);
        let before = roomy.read_file("/data/LocalData.csv").unwrap().len();
        engine
            .sample_and_append(&roomy, &mut sensors, &FixedClock)
            .unwrap();
        let after = roomy.read_file("/data/LocalData.csv").unwrap().len();
        assert_eq!(after - before, 25);
    }

    #[test]
    fn test_measurement_count_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut sensors = StaticSensors::new(
            r#"{"sensors":[{"parameters":[{"name":"temp","unit":"C"}]}]}"#,
            r#"{"measurements":[{"value":"21.5"},{"value":"40"}]}"#,
        );
        let mut engine = enabled_engine(0);

        let result = engine.sample_and_append(&storage, &mut sensors, &FixedClock);
        assert!(matches!(
            result,
            Err(LoggerError::SchemaMismatch { expected: 1, found: 2 })
        ));
        assert_eq!(
            storage.read_file("/data/LocalData.csv").unwrap(),
            "time,temp (C)\n"
        );
    }

    #[test]
    fn test_malformed_measurements_abort_cycle() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut sensors = StaticSensors::new(
            r#"{"sensors":[{"parameters":[{"name":"temp","unit":"C"}]}]}"#,
            "{measurements",
        );
        let mut engine = enabled_engine(0);

        let result = engine.sample_and_append(&storage, &mut sensors, &FixedClock);
        assert!(matches!(result, Err(LoggerError::ConfigParse(_))));
        assert_eq!(
            storage.read_file("/data/LocalData.csv").unwrap(),
            "time,temp (C)\n"
        );
    }

    #[test]
    fn test_trigger_action_bypasses_period() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut sensors = StaticSensors::temperature();
        let mut engine = enabled_engine(60_000);

        engine
            .trigger_action(&storage, &mut sensors, &FixedClock)
            .unwrap();

        let contents = storage.read_file("/data/LocalData.csv").unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_enable_transition_resets_accumulator() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path()).with_free_space(1024);
        let mut sensors = StaticSensors::temperature();
        let mut engine = enabled_engine(1000);

        assert!(engine.tick(900, &storage, &mut sensors, &FixedClock).is_none());
        engine.set_enabled(false);
        engine.set_enabled(true);
        assert!(engine.tick(900, &storage, &mut sensors, &FixedClock).is_none());
    }
}
