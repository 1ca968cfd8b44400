//! Custom error types for the check-imu monitor.
//!
//! Faults raised by a capture source keep the failed operation and its
//! arguments so the top-level handler can report them precisely. Everything
//! else is a generic runtime fault.

use thiserror::Error;

/// A fault signalled by a capture source (device, transport, stream).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{function}({args}): {message}")]
pub struct CaptureError {
    /// Name of the operation that failed, e.g. `wait_for_frames`.
    pub function: String,
    /// Arguments the operation was called with, rendered as text.
    pub args: String,
    pub message: String,
}

impl CaptureError {
    pub fn new(
        function: impl Into<String>,
        args: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            function: function.into(),
            args: args.into(),
            message: message.into(),
        }
    }
}

/// Errors related to application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(#[from] ::config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors related to terminal output
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Terminal write failed: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Errors related to process-level service setup
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Signal handling error: {0}")]
    SignalError(String),
}

/// Application-level errors that can wrap other error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Capture error calling {}({}):\n    {}", .0.function, .0.args, .0.message)]
    Capture(#[from] CaptureError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn is_capture_fault(&self) -> bool {
        matches!(self, AppError::Capture(_))
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;
