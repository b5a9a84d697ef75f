//! Error types for camera capture.
//!
//! This module provides error handling for the netcam capture library.
//! All errors implement the `std::error::Error` trait and include structured
//! context for debugging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Session Errors**: SDK init, login, or stream start/stop failures
//! - **Decoder Errors**: decode-channel acquisition, stream open, callback
//!   registration, or playback failures in the vendor stream decoder
//! - **Format Errors**: malformed decoded plane buffers
//! - **Config Errors**: camera configuration parsing failures
//!
//! Two runtime conditions are deliberately *not* errors: decoder backpressure
//! (surfaced as [`FeedOutcome::BufferFull`](crate::sdk::FeedOutcome) and
//! retried) and callbacks arriving for a stale stream handle (silently
//! ignored).
//!
//! ## Recovery and Retry
//!
//! Errors classify themselves as retryable or not:
//!
//! ```rust
//! use netcam::CaptureError;
//!
//! let error = CaptureError::session("login", "device refused credentials");
//! if error.is_retryable() {
//!     println!("Can retry this operation");
//! }
//! ```

use thiserror::Error;

/// Result type alias for capture operations.
pub type Result<T, E = CaptureError> = std::result::Result<T, E>;

/// Main error type for capture operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("Session failure during {stage}: {reason}")]
    Session {
        stage: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Decoder failure during {operation}: {reason}")]
    Decoder { operation: String, reason: String },

    #[error("Malformed plane buffer: expected {expected} bytes for {width}x{height}, got {actual}")]
    Format { expected: usize, actual: usize, width: u32, height: u32 },

    #[error("Invalid frame geometry: {width}x{height}")]
    Geometry { width: u32, height: u32 },

    #[error("Configuration error: {reason}")]
    Config {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CaptureError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Session and decoder failures are transient by nature (the device may
    /// come back, the decoder may recover on the next open). Format and
    /// geometry violations describe the data itself and retrying the same
    /// input cannot succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CaptureError::Session { .. } => true,
            CaptureError::Decoder { .. } => true,
            CaptureError::Format { .. } => false,
            CaptureError::Geometry { .. } => false,
            CaptureError::Config { .. } => false,
        }
    }

    /// Helper constructor for session lifecycle errors.
    pub fn session(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        CaptureError::Session { stage: stage.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for session lifecycle errors with a source.
    pub fn session_with_source(
        stage: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        CaptureError::Session { stage: stage.into(), reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for decoder collaborator errors.
    pub fn decoder(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CaptureError::Decoder { operation: operation.into(), reason: reason.into() }
    }

    /// Helper constructor for malformed plane buffers.
    pub fn format(expected: usize, actual: usize, width: u32, height: u32) -> Self {
        CaptureError::Format { expected, actual, width, height }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        CaptureError::Config { reason: reason.into(), source: None }
    }
}

impl From<serde_yaml_ng::Error> for CaptureError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        CaptureError::Config {
            reason: "invalid camera config YAML".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Config {
            reason: "failed to read camera config".to_string(),
            source: Some(Box::new(err)),
        }
    }
}
