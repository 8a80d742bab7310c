//! Local HTTP listeners.
//!
//! [`HttpListener::accept`] only takes a pending connection off the backlog,
//! which makes it cancel-safe inside `tokio::select!`. Reading the request
//! head is a separate, bounded step on the returned [`HttpConnection`].
//!
//! # Example Usage
//!
//! ```no_run
//! use doorcam_network::{HttpListener, HttpResponse};
//! use std::time::Duration;
//!
//! # async fn example() -> doorcam_network::Result<()> {
//! let listener = HttpListener::bind("0.0.0.0:81".parse().unwrap(), "capture").await?;
//!
//! let mut connection = listener.accept().await?;
//! let head = connection.read_head(Duration::from_secs(2)).await?;
//! connection.respond(&HttpResponse::not_found(&head.path)).await?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::codec::{HttpRequestCodec, RequestHead};
use crate::error::{NetworkError, Result};
use crate::response::HttpResponse;

/// TCP listener for one local HTTP endpoint.
#[derive(Debug)]
pub struct HttpListener {
    listener: TcpListener,
    name: &'static str,
}

impl HttpListener {
    /// Bind a listener.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::BindFailed`] if the address is in use or the
    /// port is privileged.
    pub async fn bind(addr: SocketAddr, name: &'static str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NetworkError::BindFailed { addr, source })?;

        info!(listener = name, addr = %listener.local_addr()?, "Listener bound");

        Ok(Self { listener, name })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Take the next pending connection.
    ///
    /// Cancel-safe: dropping the future before it completes never loses a
    /// connection.
    pub async fn accept(&self) -> Result<HttpConnection> {
        let (stream, peer) = self.listener.accept().await?;
        debug!(listener = self.name, peer = %peer, "Accepted connection");

        if let Err(e) = stream.set_nodelay(true) {
            warn!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        Ok(HttpConnection { stream, peer })
    }
}

/// One accepted client connection.
#[derive(Debug)]
pub struct HttpConnection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl HttpConnection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Read the request head, giving up after `limit`.
    ///
    /// Bytes following the head are discarded; only bodiless requests are
    /// served.
    pub async fn read_head(&mut self, limit: Duration) -> Result<RequestHead> {
        let mut framed = FramedRead::new(&mut self.stream, HttpRequestCodec::new());

        match tokio::time::timeout(limit, framed.next()).await {
            Ok(Some(result)) => result,
            Ok(None) => Err(NetworkError::ConnectionClosed),
            Err(_) => Err(NetworkError::ReadTimeout(limit)),
        }
    }

    /// Whether the peer still has the connection open.
    ///
    /// Never waits. A pending read means nothing arrived, which counts as
    /// alive; end-of-stream or a socket error counts as gone. Any bytes the
    /// peer did send are discarded.
    pub fn is_peer_alive(&self) -> bool {
        let mut scratch = [0u8; 64];
        match self.stream.try_read(&mut scratch) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => true,
            Err(_) => false,
        }
    }

    /// Write a complete response.
    pub async fn respond(&mut self, response: &HttpResponse) -> Result<()> {
        response.write_to(&mut self.stream).await?;
        Ok(())
    }

    /// Write raw bytes, used for streaming bodies.
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    /// Flush and close the write half.
    pub async fn close(mut self) -> Result<()> {
        self.stream.flush().await?;
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            // Peer already gone
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
