//! # Error Types
//!
//! Custom error types for Gamepad Dynamics using `thiserror`.
//!
//! Every fault is raised synchronously at the call that violated a
//! precondition. Nothing inside the engine retries.

use thiserror::Error;

/// Main error type for Gamepad Dynamics
#[derive(Debug, Error)]
pub enum EngineError {
    /// NaN numeric input, undefined enum value, or missing required callback.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A caller-supplied shaping function broke its contract (returned NaN).
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Timing or tuning parameter rejected by a setter.
    #[error("Parameter out of range: {0}")]
    OutOfRange(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw-sample source errors (device open, event fetch)
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable gamepad device was found
    #[error("No gamepad device found")]
    ControllerNotFound,
}

/// Result type alias for Gamepad Dynamics
pub type Result<T> = std::result::Result<T, EngineError>;

/// Rejects NaN before it reaches any state.
pub(crate) fn ensure_not_nan(name: &str, value: f32) -> Result<f32> {
    if value.is_nan() {
        return Err(EngineError::InvalidArgument(format!("{} must not be NaN", name)));
    }
    Ok(value)
}
