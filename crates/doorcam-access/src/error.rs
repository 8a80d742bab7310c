//! Error types for the access control loop.

use thiserror::Error;

/// Result type alias for access control operations.
pub type Result<T> = std::result::Result<T, AccessError>;

#[derive(Debug, Error)]
pub enum AccessError {
    /// Requested state transition is not allowed from the current state.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Identifier could not be normalized.
    #[error("Credential error: {0}")]
    Credential(#[from] doorcam_core::Error),

    /// Peripheral failure.
    #[error("Hardware error: {0}")]
    Hardware(#[from] doorcam_hardware::HardwareError),

    /// Remote client could not be built.
    #[error("Network error: {0}")]
    Network(#[from] doorcam_network::NetworkError),
}
