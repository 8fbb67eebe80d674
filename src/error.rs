use thiserror::Error;

/// Main error type for the sensor data logger
#[derive(Debug, Error)]
pub enum LoggerError {
    // Configuration errors
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Insufficient storage space: {needed} bytes needed, {available} available")]
    InsufficientSpace { needed: u64, available: u64 },

    // Sensor schema errors
    #[error("Invalid sensor schema: {0}")]
    Schema(String),

    #[error("Measurement count {found} does not match the {expected} columns of the data file")]
    SchemaMismatch { expected: usize, found: usize },

    // Action dispatch errors
    #[error("Unknown action: {0}")]
    UnknownAction(i32),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Whether this error came from a malformed or incomplete payload
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            LoggerError::ConfigParse(_)
                | LoggerError::MissingConfigField(_)
                | LoggerError::ConfigValidation(_)
        )
    }

    /// Whether this error came from the storage layer
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            LoggerError::Storage(_) | LoggerError::InsufficientSpace { .. } | LoggerError::Io(_)
        )
    }

    /// Whether this error came from the measurement schema
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            LoggerError::Schema(_) | LoggerError::SchemaMismatch { .. }
        )
    }
}

/// Result type alias for logger operations
pub type Result<T> = std::result::Result<T, LoggerError>;
