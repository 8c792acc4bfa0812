//! Error types for configuration, hardware collaborators and the loop

use thiserror::Error;

/// Construction-time failures. Always fatal, raised before the loop starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("step sequence must not be empty")]
    EmptyStepSequence,

    #[error("inverted range for {name}: min {min} > max {max}")]
    InvertedRange { name: &'static str, min: f64, max: f64 },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures reported by the sensor or actuator collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HardwareError {
    #[error("sensor read failed: {0}")]
    Read(String),

    #[error("actuator write failed: {0}")]
    Write(String),
}

#[derive(Error, Debug)]
pub enum ControlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

pub type Result<T, E = ControlError> = std::result::Result<T, E>;
