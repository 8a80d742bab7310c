//! Immutable endpoint configuration.
//!
//! [`EndpointConfig`] is built once at startup, either from defaults or from a
//! TOML file, validated, and then only ever handed out by shared reference.
//! No component mutates it after construction.
//!
//! # Example
//!
//! ```
//! use doorcam_core::EndpointConfig;
//! use std::time::Duration;
//!
//! let config = EndpointConfig::from_toml_str(r#"
//!     remote_base_url = "http://10.0.0.5:5000"
//!     pulse_width_ms = 750
//!
//!     [network]
//!     ssid = "lab"
//!     password = "secret"
//! "#).unwrap();
//!
//! assert_eq!(config.send_uuid_url(), "http://10.0.0.5:5000/api/send_uuid");
//! assert_eq!(config.pulse_width(), Duration::from_millis(750));
//! assert_eq!(config.stream_port, 80);
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::*;
use crate::{Error, Result};

/// Access point credentials used during network association.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkCredentials {
    pub ssid: String,
    pub password: String,
}

impl fmt::Debug for NetworkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sensor output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSize {
    Qqvga,
    Qvga,
    #[default]
    Vga,
    Svga,
    Xga,
    Uxga,
}

impl FrameSize {
    /// Width and height in pixels.
    pub fn dimensions(&self) -> (u16, u16) {
        match self {
            Self::Qqvga => (160, 120),
            Self::Qvga => (320, 240),
            Self::Vga => (640, 480),
            Self::Svga => (800, 600),
            Self::Xga => (1024, 768),
            Self::Uxga => (1600, 1200),
        }
    }
}

/// Settings applied to the camera adapter at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub frame_size: FrameSize,

    /// JPEG quality, 0-63, lower is better.
    pub jpeg_quality: u8,

    /// Number of frame buffers the driver may hand out.
    pub frame_buffers: u8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            frame_size: FrameSize::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            frame_buffers: DEFAULT_FRAME_BUFFERS,
        }
    }
}

/// Process-wide endpoint configuration.
///
/// Intervals are stored in milliseconds so the TOML surface stays flat;
/// use the `Duration` accessors in code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base address of the remote authorization/upload service.
    pub remote_base_url: String,

    /// Access point the device associates with before binding.
    pub network: NetworkCredentials,

    /// Host both listeners bind to.
    pub bind_host: String,

    /// Port of the streaming listener.
    pub stream_port: u16,

    /// Port of the capture listener.
    pub capture_port: u16,

    /// How long the actuator stays engaged on approval.
    pub pulse_width_ms: u64,

    /// Dead time after a scan during which detections are ignored.
    pub debounce_ms: u64,

    /// Whether a denied scan also enters the cooldown period.
    pub cooldown_on_denial: bool,

    /// Pause between two frames of a stream session.
    pub stream_frame_interval_ms: u64,

    /// Timeout the transport applies to remote requests.
    pub request_timeout_ms: u64,

    /// Time a local client has to send its request head.
    pub request_read_timeout_ms: u64,

    /// Interval between association checks at startup.
    pub association_poll_ms: u64,

    /// Upper bound on how long an idle dispatch iteration waits.
    pub idle_tick_ms: u64,

    pub camera: CameraSettings,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            network: NetworkCredentials::default(),
            bind_host: DEFAULT_BIND_HOST.to_string(),
            stream_port: DEFAULT_STREAM_PORT,
            capture_port: DEFAULT_CAPTURE_PORT,
            pulse_width_ms: DEFAULT_PULSE_WIDTH_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            cooldown_on_denial: false,
            stream_frame_interval_ms: DEFAULT_STREAM_FRAME_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            request_read_timeout_ms: DEFAULT_REQUEST_READ_TIMEOUT_MS,
            association_poll_ms: DEFAULT_ASSOCIATION_POLL_MS,
            idle_tick_ms: DEFAULT_IDLE_TICK_MS,
            camera: CameraSettings::default(),
        }
    }
}

impl EndpointConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    /// Returns `Error::ConfigParse` for malformed TOML and `Error::Config`
    /// if validation fails.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the invariants the rest of the endpoint relies on.
    pub fn validate(&self) -> Result<()> {
        let base = self.remote_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "remote_base_url must start with http:// or https://, got {:?}",
                self.remote_base_url
            )));
        }
        if self.stream_port == 0 || self.capture_port == 0 {
            return Err(Error::Config("listener ports must be non-zero".to_string()));
        }
        if self.stream_port == self.capture_port {
            return Err(Error::Config(format!(
                "stream_port and capture_port must differ, both are {}",
                self.stream_port
            )));
        }
        if self.pulse_width_ms == 0 {
            return Err(Error::Config("pulse_width_ms must be non-zero".to_string()));
        }
        if self.camera.jpeg_quality > MAX_JPEG_QUALITY {
            return Err(Error::Config(format!(
                "camera.jpeg_quality must be 0-{MAX_JPEG_QUALITY}, got {}",
                self.camera.jpeg_quality
            )));
        }
        if self.camera.frame_buffers == 0 {
            return Err(Error::Config(
                "camera.frame_buffers must be at least 1".to_string(),
            ));
        }
        self.stream_addr()?;
        self.capture_addr()?;
        Ok(())
    }

    /// Full URL of the authorization endpoint.
    pub fn send_uuid_url(&self) -> String {
        self.remote_url(SEND_UUID_PATH)
    }

    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        self.remote_url(UPLOAD_PATH)
    }

    fn remote_url(&self, path: &str) -> String {
        format!("{}{}", self.remote_base_url.trim().trim_end_matches('/'), path)
    }

    pub fn stream_addr(&self) -> Result<SocketAddr> {
        self.listener_addr(self.stream_port)
    }

    pub fn capture_addr(&self) -> Result<SocketAddr> {
        self.listener_addr(self.capture_port)
    }

    fn listener_addr(&self, port: u16) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_host, port)
            .parse()
            .map_err(|_| Error::Config(format!("invalid bind_host {:?}", self.bind_host)))
    }

    pub fn pulse_width(&self) -> Duration {
        Duration::from_millis(self.pulse_width_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn stream_frame_interval(&self) -> Duration {
        Duration::from_millis(self.stream_frame_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn request_read_timeout(&self) -> Duration {
        Duration::from_millis(self.request_read_timeout_ms)
    }

    pub fn association_poll(&self) -> Duration {
        Duration::from_millis(self.association_poll_ms)
    }

    pub fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms)
    }
}
