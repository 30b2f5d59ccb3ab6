//! Centralized error types for the bridge core library.
//!
//! Each subsystem defines its own error enum next to the code that raises it.
//! This module ties them together:
//! - [`ErrorCode`] gives every error a stable machine-readable code for logs
//! - [`BridgeError`] is the umbrella type used at the composition root

use thiserror::Error;

use crate::device::InvalidAddress;
use crate::mqtt::BusError;
use crate::registry::RegistryError;
use crate::shell::ShellError;
use crate::supervisor::ApiError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code for log output.
    fn code(&self) -> &'static str;
}

impl ErrorCode for ShellError {
    fn code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "tool_spawn_failed",
            Self::Timeout { .. } => "tool_timeout",
            Self::Io(_) => "tool_io_error",
        }
    }
}

impl ErrorCode for BusError {
    fn code(&self) -> &'static str {
        match self {
            Self::Client(_) => "bus_enqueue_failed",
            Self::NotConnected => "bus_not_connected",
            Self::InvalidConfig(_) => "bus_invalid_config",
        }
    }
}

impl ErrorCode for ApiError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
        }
    }
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "options_unreadable",
            Self::Parse(_) => "options_invalid_json",
        }
    }
}

impl ErrorCode for InvalidAddress {
    fn code(&self) -> &'static str {
        "invalid_address"
    }
}

/// Application-wide error type for the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An external tool could not be run.
    #[error("Device tool failed: {0}")]
    Shell(#[from] ShellError),

    /// The message bus rejected an operation.
    #[error("Message bus error: {0}")]
    Bus(#[from] BusError),

    /// A Supervisor REST call failed.
    #[error("Supervisor API error: {0}")]
    Api(#[from] ApiError),

    /// The options document could not be loaded.
    #[error("Options error: {0}")]
    Registry(#[from] RegistryError),

    /// A device status could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Startup configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The options document yielded no usable speaker.
    #[error("No speakers configured in {0}")]
    NoSpeakers(String),
}

impl ErrorCode for BridgeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Shell(e) => e.code(),
            Self::Bus(e) => e.code(),
            Self::Api(e) => e.code(),
            Self::Registry(e) => e.code(),
            Self::Serialization(_) => "serialization_failed",
            Self::Configuration(_) => "configuration_error",
            Self::NoSpeakers(_) => "no_speakers",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

pub use crate::mqtt::BusResult;
pub use crate::shell::ShellResult;
pub use crate::supervisor::ApiResult;

/// Convenient Result alias for application-wide operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_code() {
        let err = BridgeError::from(BusError::NotConnected);
        assert_eq!(err.code(), "bus_not_connected");

        let err = BridgeError::from(ShellError::Timeout {
            program: "pactl".into(),
            secs: 5,
        });
        assert_eq!(err.code(), "tool_timeout");
    }

    #[test]
    fn configuration_error_returns_correct_code() {
        let err = BridgeError::Configuration("bad interval".into());
        assert_eq!(err.code(), "configuration_error");
        assert_eq!(err.to_string(), "Configuration error: bad interval");
    }

    #[test]
    fn no_speakers_names_the_options_file() {
        let err = BridgeError::NoSpeakers("/data/options.json".into());
        assert_eq!(err.code(), "no_speakers");
        assert!(err.to_string().contains("/data/options.json"));
    }
}
