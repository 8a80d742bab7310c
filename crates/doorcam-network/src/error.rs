//! Error types for the network layer.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors raised by the listeners and the remote client.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Failed to bind a listener.
    #[error("Failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Request head could not be parsed.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Request head grew past the configured limit.
    #[error("Request head exceeds {max_size} bytes")]
    HeadTooLarge { max_size: usize },

    /// Client did not finish sending its request head in time.
    #[error("Timed out reading request head after {0:?}")]
    ReadTimeout(Duration),

    /// Client closed the connection before a complete request head.
    #[error("Connection closed before a complete request head")]
    ConnectionClosed,

    /// Remote HTTP request failed at the transport level.
    #[error("Remote request failed: {0}")]
    Remote(#[from] reqwest::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetworkError {
    /// Whether the remote request failed because it ran out of time.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::ReadTimeout(_) => true,
            Self::Remote(e) => e.is_timeout(),
            _ => false,
        }
    }
}
