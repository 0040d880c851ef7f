//! Layered error definitions
//!
//! Categorized by source: config / sensor / sink / counter

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sensor Errors =====
    /// Sensor registration/enable failure
    #[error("sensor '{stream_id}' unavailable: {message}")]
    SensorUnavailable { stream_id: String, message: String },

    /// Stream referenced by configuration but not registered
    #[error("stream not registered: {stream_id}")]
    StreamMissing { stream_id: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== Counter Errors =====
    /// Persisted daily counter I/O failure
    #[error("daily counter persist error at '{path}': {message}")]
    CounterPersist { path: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sensor unavailable error
    pub fn sensor_unavailable(stream_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SensorUnavailable {
            stream_id: stream_id.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create counter persist error
    pub fn counter_persist(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CounterPersist {
            path: path.into(),
            message: message.into(),
        }
    }
}
