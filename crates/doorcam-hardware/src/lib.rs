//! Peripheral abstraction layer for the doorcam endpoint.
//!
//! This crate defines the adapter traits the endpoint drives: a proximity
//! credential reader, an image sensor, a lock relay and a wireless link.
//! Mock implementations live in [`mock`] and are what the simulator and the
//! test suites run against; real drivers slot in as new variants of the
//! enums in [`devices`].
//!
//! # Design Philosophy
//!
//! - **Async-first**: every I/O operation is a native `async fn` in a trait
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Non-blocking polls**: presence checks and liveness checks answer
//!   immediately, so one cooperative loop can serve every duty.
//! - **Buffer safety**: frames are held through [`FrameLease`], which hands
//!   the buffer back to the camera on every exit path.
//! - **Error-aware**: all operations return [`Result<T>`][error::Result]
//!   carrying a [`HardwareError`].
//!
//! # Reading a credential
//!
//! ```no_run
//! use doorcam_hardware::traits::CredentialReader;
//! use doorcam_hardware::error::Result;
//!
//! async fn scan<R: CredentialReader>(reader: &mut R) -> Result<Option<Vec<u8>>> {
//!     if !reader.is_token_present().await? {
//!         return Ok(None);
//!     }
//!     let uid = reader.read_uid().await?;
//!     reader.halt().await?;
//!     Ok(Some(uid))
//! }
//! ```
//!
//! # Holding a frame
//!
//! ```no_run
//! use doorcam_hardware::traits::{Camera, FrameLease};
//! use doorcam_hardware::error::Result;
//!
//! async fn snapshot<C: Camera>(camera: &mut C) -> Result<Vec<u8>> {
//!     let lease = FrameLease::acquire(camera).await?;
//!     Ok(lease.data().to_vec())
//! }
//! ```

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{Actuator, Camera, CredentialReader, Frame, FrameLease, NetworkLink};
pub use types::DeviceInfo;
