//! Error types for Chalak

use crate::core::types::ActuatorRole;
use std::time::Duration;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Chalak error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong channel kind or role for the requested operation
    #[error("Channel error: {role} {detail}")]
    Channel {
        /// Channel the operation was addressed to
        role: ActuatorRole,
        /// What was wrong with it
        detail: &'static str,
    },

    /// Operation not allowed in the channel's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Caller contract violation (e.g. negative duration)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Range sensor echo did not arrive within its window
    #[error("Range sensor timed out after {0:?}")]
    SensorTimeout(Duration),

    /// Malformed operator input
    #[error("Input error: {0}")]
    Input(String),

    /// Output or sensor hardware failure
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// Short label that fits on one display line
    pub fn label(&self) -> &'static str {
        match self {
            Error::Channel { .. } => "Channel error",
            Error::InvalidState(_) => "Invalid state",
            Error::InvalidArgument(_) => "Bad argument",
            Error::SensorTimeout(_) => "Sensor timeout",
            Error::Input(_) => "Bad input",
            Error::Hardware(_) => "Hardware fault",
            Error::Io(_) => "I/O error",
            Error::Config(_) => "Config error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_fit_display_line() {
        let errors = [
            Error::Channel {
                role: ActuatorRole::Buzzer,
                detail: "is not binary",
            },
            Error::InvalidState("buzzer active".into()),
            Error::InvalidArgument("negative duration".into()),
            Error::SensorTimeout(Duration::from_millis(40)),
            Error::Input("jump".into()),
            Error::Hardware("gpio5".into()),
            Error::Io(std::io::Error::other("disk")),
            Error::Config("bad".into()),
        ];
        for e in &errors {
            assert!(e.label().len() <= 16, "{} too long", e.label());
        }
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let err: Error = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, Error::Config(_)));
    }
}
