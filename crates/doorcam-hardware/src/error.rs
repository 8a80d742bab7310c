//! Error types for hardware operations.
//!
//! This module defines error types specific to peripheral adapter operations:
//! disconnection, failed token reads, failed frame captures, actuator faults
//! and network association problems.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Token read error (reader busy, collision, no token in field).
    #[error("Token read error: {message}")]
    TokenReadError { message: String },

    /// Frame capture error.
    #[error("Frame capture error: {message}")]
    CaptureError { message: String },

    /// Actuator drive error.
    #[error("Actuator error: {message}")]
    ActuatorError { message: String },

    /// Network association error.
    #[error("Association error: {message}")]
    AssociationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new token read error.
    pub fn token_read(message: impl Into<String>) -> Self {
        Self::TokenReadError {
            message: message.into(),
        }
    }

    /// Create a new frame capture error.
    pub fn capture(message: impl Into<String>) -> Self {
        Self::CaptureError {
            message: message.into(),
        }
    }

    /// Create a new actuator error.
    pub fn actuator(message: impl Into<String>) -> Self {
        Self::ActuatorError {
            message: message.into(),
        }
    }

    /// Create a new association error.
    pub fn association(message: impl Into<String>) -> Self {
        Self::AssociationError {
            message: message.into(),
        }
    }

    /// Whether the failure is expected to clear on the next attempt.
    ///
    /// Transient failures skip the current iteration; the loop carries on.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TokenReadError { .. } | Self::CaptureError { .. }
        )
    }
}
