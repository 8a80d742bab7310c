//! Wire-level constants and configuration defaults.
//!
//! This module collects every fixed value the endpoint exchanges with the
//! outside world: remote service paths, the authorization success marker,
//! the multipart boundary and the header values sent to browsers. Defaults
//! for [`EndpointConfig`](crate::EndpointConfig) live here as well so tests
//! and documentation can refer to them by name.
//!
//! # Remote service
//!
//! ```text
//! POST <remote-base>/api/send_uuid   {"uuid": "<canonical identifier>"}
//! POST <remote-base>/api/upload      <raw JPEG bytes>
//! ```
//!
//! # Local listeners
//!
//! | Port | Path | Purpose |
//! |------|------|---------|
//! | 80 | `/stream` | MJPEG multipart stream |
//! | 81 | `/capture` | one-shot capture and forward |

// ============================================================================
// Remote Service
// ============================================================================

/// Path of the authorization endpoint, relative to the remote base address.
pub const SEND_UUID_PATH: &str = "/api/send_uuid";

/// Path of the frame upload endpoint, relative to the remote base address.
pub const UPLOAD_PATH: &str = "/api/upload";

/// Literal the authorization response body must contain to approve a scan.
///
/// Matching is a plain substring search. A semantically equal body with
/// different whitespace (`{"status": "ok"}`) does NOT match and is denied.
///
/// # Examples
///
/// ```
/// use doorcam_core::constants::SUCCESS_MARKER;
///
/// assert!(r#"{"status":"ok"}"#.contains(SUCCESS_MARKER));
/// assert!(!r#"{"status": "ok"}"#.contains(SUCCESS_MARKER));
/// ```
pub const SUCCESS_MARKER: &str = r#""status":"ok""#;

// ============================================================================
// Local Listeners
// ============================================================================

/// Path served by the streaming listener.
pub const STREAM_PATH: &str = "/stream";

/// Path served by the capture listener.
pub const CAPTURE_PATH: &str = "/capture";

/// Multipart boundary token used by the stream.
pub const STREAM_BOUNDARY: &str = "frame";

/// Content type of the stream response.
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Content type of each stream part.
pub const FRAME_CONTENT_TYPE: &str = "image/jpeg";

/// Content type of the upload request body.
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type of the relayed capture response.
pub const CAPTURE_RESPONSE_CONTENT_TYPE: &str = "application/json";

/// Value of `Access-Control-Allow-Origin` on every browser-facing response.
pub const ALLOW_ANY_ORIGIN: &str = "*";

/// Value of `Cache-Control` on the stream response.
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Body sent when the camera yields no frame on a capture request.
pub const CAPTURE_FAILED_MESSAGE: &str = "Camera capture failed";

/// Maximum size of an incoming request head (request line and headers).
pub const MAX_REQUEST_HEAD_SIZE: usize = 8 * 1024;

// ============================================================================
// Credential Identifiers
// ============================================================================

/// Maximum UID length in bytes (ISO 14443 triple-size UID).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Configuration Defaults
// ============================================================================

/// Default remote service base address.
pub const DEFAULT_REMOTE_BASE_URL: &str = "http://192.168.40.1:5000";

/// Default bind host for both listeners.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default streaming listener port.
pub const DEFAULT_STREAM_PORT: u16 = 80;

/// Default capture listener port.
pub const DEFAULT_CAPTURE_PORT: u16 = 81;

/// Default actuation pulse width in milliseconds.
pub const DEFAULT_PULSE_WIDTH_MS: u64 = 1000;

/// Default post-scan debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 3000;

/// Default pause between two stream frames in milliseconds.
pub const DEFAULT_STREAM_FRAME_INTERVAL_MS: u64 = 50;

/// Default timeout applied by the transport to remote requests.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Default time allowed for a local client to send its request head.
pub const DEFAULT_REQUEST_READ_TIMEOUT_MS: u64 = 2000;

/// Default interval between network association checks at startup.
pub const DEFAULT_ASSOCIATION_POLL_MS: u64 = 500;

/// Default upper bound on how long one idle dispatch iteration waits.
pub const DEFAULT_IDLE_TICK_MS: u64 = 10;

/// Default JPEG quality (lower is better, 0-63).
pub const DEFAULT_JPEG_QUALITY: u8 = 10;

/// Highest JPEG quality value accepted by the sensor.
pub const MAX_JPEG_QUALITY: u8 = 63;

/// Default number of frame buffers allocated by the camera driver.
pub const DEFAULT_FRAME_BUFFERS: u8 = 2;
