//! Enum wrappers for peripheral dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn Camera>` is
//! not an option. These enums give the endpoint one concrete type per
//! peripheral role while letting the backing driver vary.
//!
//! # Examples
//!
//! ```
//! use doorcam_hardware::devices::AnyCredentialReader;
//! use doorcam_hardware::mock::MockReader;
//!
//! let (reader, _handle) = MockReader::new();
//! let any_reader = AnyCredentialReader::Mock(reader);
//!
//! // Can now be used through the CredentialReader trait
//! ```

use std::net::IpAddr;

use doorcam_core::{CameraSettings, NetworkCredentials};

use crate::mock::{MockActuator, MockCamera, MockLink, MockReader};
use crate::traits::{Actuator, Camera, CredentialReader, Frame, NetworkLink};
use crate::{DeviceInfo, Result};

/// Enum wrapper for credential reader dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCredentialReader {
    /// Mock reader for development and testing.
    Mock(MockReader),
}

impl CredentialReader for AnyCredentialReader {
    async fn is_token_present(&mut self) -> Result<bool> {
        match self {
            Self::Mock(device) => device.is_token_present().await,
        }
    }

    async fn read_uid(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::Mock(device) => device.read_uid().await,
        }
    }

    async fn halt(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.halt().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for camera dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCamera {
    /// Mock camera for development and testing.
    Mock(MockCamera),
}

impl Camera for AnyCamera {
    async fn configure(&mut self, settings: &CameraSettings) -> Result<()> {
        match self {
            Self::Mock(device) => device.configure(settings).await,
        }
    }

    async fn capture(&mut self) -> Result<Frame> {
        match self {
            Self::Mock(device) => device.capture().await,
        }
    }

    fn release(&mut self, frame: Frame) {
        match self {
            Self::Mock(device) => device.release(frame),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for lock actuator dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyActuator {
    /// Mock relay for development and testing.
    Mock(MockActuator),
}

impl Actuator for AnyActuator {
    async fn engage(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.engage().await,
        }
    }

    async fn release(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.release().await,
        }
    }

    fn is_engaged(&self) -> bool {
        match self {
            Self::Mock(device) => device.is_engaged(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for network link dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyNetworkLink {
    /// Mock link for development and testing.
    Mock(MockLink),
}

impl NetworkLink for AnyNetworkLink {
    async fn associate(&mut self, credentials: &NetworkCredentials) -> Result<()> {
        match self {
            Self::Mock(link) => link.associate(credentials).await,
        }
    }

    async fn is_associated(&mut self) -> bool {
        match self {
            Self::Mock(link) => link.is_associated().await,
        }
    }

    fn local_ip(&self) -> Option<IpAddr> {
        match self {
            Self::Mock(link) => link.local_ip(),
        }
    }
}
