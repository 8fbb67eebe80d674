// Sensors module - Measurement source and its JSON payloads

mod system;

pub use system::SystemSensors;

use crate::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source of sensor metadata and readings
///
/// Both payloads are serialized JSON:
/// `{"sensors":[{"parameters":[{"name":..,"unit":..}]}]}` and
/// `{"measurements":[{"value":..}]}`, with measurements in the same order
/// as the flattened parameter list.
pub trait MeasurementSource {
    /// Describe every sensor and the parameters it reports
    fn sensor_info(&self) -> String;

    /// Latest reading of every parameter
    fn latest_measurements(&mut self) -> String;
}

/// Sensor metadata payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInfo {
    pub sensors: Vec<SensorDescriptor>,
}

/// One sensor and the parameters it reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
}

/// A named, unit-labelled measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub unit: String,
}

impl SensorInfo {
    /// Parse a sensor metadata payload
    ///
    /// Text that is not JSON is a parse error; JSON without the expected
    /// sensors/parameters shape is a schema error.
    pub fn parse(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| LoggerError::ConfigParse(format!("Sensor info is not valid JSON: {}", e)))?;

        serde_json::from_value(value).map_err(|e| LoggerError::Schema(e.to_string()))
    }

    /// Flattened parameter list in sensor order
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.sensors.iter().flat_map(|sensor| sensor.parameters.iter())
    }
}

/// Measurement payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    pub measurements: Vec<Measurement>,
}

/// A single reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Value,
}

impl Measurement {
    /// Render the value as a CSV cell
    ///
    /// Strings that would split the cell or the row are rejected.
    pub fn as_cell(&self) -> Result<String> {
        match &self.value {
            Value::String(s) if s.contains(&[',', '\n', '\r'][..]) => Err(
                LoggerError::ConfigParse(format!("Measurement value contains a delimiter: {:?}", s)),
            ),
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }
}

impl MeasurementSet {
    /// Parse a measurement payload
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| LoggerError::ConfigParse(format!("Invalid measurement payload: {}", e)))
    }

    /// Render every value as a CSV cell, in order
    pub fn cells(&self) -> Result<Vec<String>> {
        self.measurements.iter().map(Measurement::as_cell).collect()
    }
}
