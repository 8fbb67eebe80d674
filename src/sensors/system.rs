use crate::sensors::{
    Measurement, MeasurementSet, MeasurementSource, ParameterDescriptor, SensorDescriptor,
    SensorInfo,
};
use serde_json::Value;
use sysinfo::{Components, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Measurement source reporting host load and component temperatures
pub struct SystemSensors {
    /// System information collector
    system: System,
    /// Temperature sensors, fixed at construction so the column set is stable
    components: Components,
}

impl SystemSensors {
    /// Create a new system sensor source
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is computed between two refreshes
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            system,
            components: Components::new_with_refreshed_list(),
        }
    }

    fn describe(&self) -> SensorInfo {
        let mut sensors = vec![SensorDescriptor {
            name: Some("system".to_string()),
            parameters: vec![
                parameter("cpu", "%"),
                parameter("memory", "MB"),
                parameter("swap", "MB"),
            ],
        }];

        if !self.components.list().is_empty() {
            sensors.push(SensorDescriptor {
                name: Some("temperature".to_string()),
                parameters: self
                    .components
                    .list()
                    .iter()
                    .map(|component| parameter(component.label(), "C"))
                    .collect(),
            });
        }

        SensorInfo { sensors }
    }
}

impl Default for SystemSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSource for SystemSensors {
    fn sensor_info(&self) -> String {
        serde_json::to_string(&self.describe()).unwrap_or_default()
    }

    fn latest_measurements(&mut self) -> String {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.components.refresh();

        let mut measurements = vec![
            reading(format!("{:.1}", self.system.global_cpu_usage())),
            reading(format!("{:.1}", self.system.used_memory() as f64 / BYTES_PER_MB)),
            reading(format!("{:.1}", self.system.used_swap() as f64 / BYTES_PER_MB)),
        ];

        measurements.extend(
            self.components
                .list()
                .iter()
                .map(|component| reading(format!("{:.1}", component.temperature()))),
        );

        serde_json::to_string(&MeasurementSet { measurements }).unwrap_or_default()
    }
}

fn parameter(name: &str, unit: &str) -> ParameterDescriptor {
    ParameterDescriptor {
        name: name.to_string(),
        unit: unit.to_string(),
    }
}

fn reading(value: String) -> Measurement {
    Measurement {
        value: Value::String(value),
    }
}
