//! Peripheral adapter trait definitions.
//!
//! These traits are the contract between the endpoint's control logic and the
//! peripherals it drives: the proximity credential reader, the image sensor,
//! the lock relay and the wireless link. Driver internals (bus timing, DMA
//! buffers, pin assignment) live behind them.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro. Like every RPITIT trait
//! they are not object-safe; use generics, or the enum wrappers in
//! [`devices`](crate::devices) for a concrete type.

#![allow(async_fn_in_trait)]

use std::net::IpAddr;

use doorcam_core::{CameraSettings, NetworkCredentials};

use crate::error::Result;
use crate::types::DeviceInfo;

/// Proximity credential reader.
///
/// Presence polling is non-blocking: [`is_token_present`] answers
/// immediately whether a token is in the field. Reading the identifier is
/// only meaningful after a positive poll.
///
/// [`is_token_present`]: CredentialReader::is_token_present
///
/// # Examples
///
/// ```no_run
/// use doorcam_hardware::traits::CredentialReader;
/// use doorcam_hardware::error::Result;
///
/// async fn poll_once<R: CredentialReader>(reader: &mut R) -> Result<Option<Vec<u8>>> {
///     if !reader.is_token_present().await? {
///         return Ok(None);
///     }
///     let uid = reader.read_uid().await?;
///     reader.halt().await?;
///     Ok(Some(uid))
/// }
/// ```
pub trait CredentialReader: Send + Sync {
    /// Check whether a new token is in the field, without blocking.
    async fn is_token_present(&mut self) -> Result<bool>;

    /// Read the raw UID bytes of the token in the field.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No token is present any more
    /// - The reader is busy or a collision occurred
    /// - The device is disconnected
    async fn read_uid(&mut self) -> Result<Vec<u8>>;

    /// Put the current token to sleep so it stops re-announcing itself.
    async fn halt(&mut self) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// One compressed image capture.
///
/// A frame is handed out by [`Camera::capture`] and must go back through
/// [`Camera::release`] exactly once. Prefer [`FrameLease`], which does the
/// release on every exit path.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,

    /// Driver-assigned sequence number, monotonically increasing.
    pub sequence: u64,

    /// Timestamp when the frame was captured.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Frame {
    /// Wrap a captured JPEG buffer.
    pub fn new(data: Vec<u8>, sequence: u64) -> Self {
        Self {
            data,
            sequence,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Empty stand-in left behind in a lease once its frame went back.
    fn released() -> Self {
        Self {
            data: Vec::new(),
            sequence: 0,
            timestamp: chrono::DateTime::<chrono::Utc>::MIN_UTC,
        }
    }

    /// Compressed image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Image sensor producing compressed frames on demand.
///
/// # Examples
///
/// ```no_run
/// use doorcam_hardware::traits::{Camera, FrameLease};
/// use doorcam_hardware::error::Result;
///
/// async fn frame_size<C: Camera>(camera: &mut C) -> Result<usize> {
///     let lease = FrameLease::acquire(camera).await?;
///     Ok(lease.len())
///     // lease dropped here, frame released back to the camera
/// }
/// ```
pub trait Camera: Send + Sync {
    /// Apply resolution, quality and buffer settings.
    async fn configure(&mut self, settings: &CameraSettings) -> Result<()>;

    /// Acquire one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor produced no frame or every frame
    /// buffer is still held by a caller.
    async fn capture(&mut self) -> Result<Frame>;

    /// Hand a frame buffer back to the driver.
    fn release(&mut self, frame: Frame);

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Exclusive hold on one captured frame.
///
/// The lease borrows the camera for its whole lifetime and releases the
/// frame when dropped, so early returns and `?` cannot leak a buffer.
pub struct FrameLease<'a, C: Camera> {
    camera: &'a mut C,
    frame: Frame,
}

impl<'a, C: Camera> FrameLease<'a, C> {
    /// Capture a frame and hold it until the lease ends.
    pub async fn acquire(camera: &'a mut C) -> Result<Self> {
        let frame = camera.capture().await?;
        Ok(Self { camera, frame })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn data(&self) -> &[u8] {
        self.frame().data()
    }

    pub fn len(&self) -> usize {
        self.frame().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame().is_empty()
    }

    pub fn sequence(&self) -> u64 {
        self.frame().sequence
    }

    /// End the lease now instead of at scope exit.
    pub fn release(self) {}
}

impl<C: Camera> Drop for FrameLease<'_, C> {
    fn drop(&mut self) {
        let frame = std::mem::replace(&mut self.frame, Frame::released());
        self.camera.release(frame);
    }
}

/// Relay-driven lock mechanism.
///
/// The actuator has two levels. Pulse timing is the caller's concern.
pub trait Actuator: Send + Sync {
    /// Drive the relay (unlock).
    async fn engage(&mut self) -> Result<()>;

    /// Release the relay (lock).
    async fn release(&mut self) -> Result<()>;

    /// Whether the relay is currently driven.
    fn is_engaged(&self) -> bool;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Wireless link the endpoint must join before serving anything.
pub trait NetworkLink: Send + Sync {
    /// Start associating with the configured access point.
    async fn associate(&mut self, credentials: &NetworkCredentials) -> Result<()>;

    /// Whether association has completed.
    async fn is_associated(&mut self) -> bool;

    /// Address obtained on the link, once associated.
    fn local_ip(&self) -> Option<IpAddr>;
}
