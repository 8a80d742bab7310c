//! Shared types for the doorcam endpoint.
//!
//! Holds the pieces every other crate agrees on: the canonical credential
//! identifier, the authorization verdict, the immutable endpoint
//! configuration and the wire constants of the remote service.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{CameraSettings, EndpointConfig, FrameSize, NetworkCredentials};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
