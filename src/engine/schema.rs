use crate::error::{LoggerError, Result};
use crate::sensors::SensorInfo;

/// Name of the leading timestamp column
pub const TIME_COLUMN: &str = "time";

/// Column layout of a data file, captured once when the file is created
///
/// The record is either derived from the sensor metadata at creation time
/// or read back from the header line of an existing file. It never changes
/// while the file exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenSchema {
    /// Measurement columns, excluding the timestamp column
    columns: Vec<String>,
}

impl FrozenSchema {
    /// Derive the column layout from a sensor metadata payload
    pub fn from_sensor_info(payload: &str) -> Result<Self> {
        let info = SensorInfo::parse(payload)?;

        let columns = info
            .parameters()
            .map(|p| {
                check_header_text(&p.name)?;
                check_header_text(&p.unit)?;
                Ok(format!("{} ({})", p.name, p.unit))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns })
    }

    /// Recover the column layout from an existing header line
    pub fn from_header_line(line: &str) -> Result<Self> {
        let mut cells = line.split(',');

        match cells.next() {
            Some(first) if first == TIME_COLUMN => {}
            _ => {
                return Err(LoggerError::Schema(format!(
                    "Data file header does not start with '{}': {}",
                    TIME_COLUMN, line
                )))
            }
        }

        Ok(Self {
            columns: cells.map(|c| c.to_string()).collect(),
        })
    }

    /// Measurement column names, excluding the timestamp column
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of measurement columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Header row including its line terminator
    pub fn header_line(&self) -> String {
        let mut header = String::from(TIME_COLUMN);
        for column in &self.columns {
            header.push(',');
            header.push_str(column);
        }
        header.push('\n');
        header
    }
}

/// Reject names the header line could not represent as a single cell
fn check_header_text(text: &str) -> Result<()> {
    if text.contains(&[',', '\n', '\r'][..]) {
        return Err(LoggerError::Schema(format!(
            "Parameter label contains a delimiter: {:?}",
            text
        )));
    }
    Ok(())
}

/// Build one data row including its line terminator
pub fn format_row(timestamp: &str, values: &[String]) -> String {
    let mut row = String::with_capacity(timestamp.len() + values.len() * 8 + 1);
    row.push_str(timestamp);
    for value in values {
        row.push(',');
        row.push_str(value);
    }
    row.push('\n');
    row
}
