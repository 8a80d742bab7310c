//! MJPEG streaming over `multipart/x-mixed-replace`.
//!
//! A [`StreamSession`] owns one client connection. Each call to
//! [`StreamSession::send_frame`] checks the peer is still there, acquires a
//! frame, writes it as one part and hands the buffer back. The session never
//! holds a frame between calls, so the caller is free to do other work
//! (access steps, capture requests) while it waits for the next frame slot.

use std::time::Duration;

use bytes::{BufMut, BytesMut};
use doorcam_core::EndpointConfig;
use doorcam_core::constants::{
    ALLOW_ANY_ORIGIN, FRAME_CONTENT_TYPE, NO_CACHE, STREAM_BOUNDARY, STREAM_CONTENT_TYPE,
};
use doorcam_hardware::{Camera, FrameLease};
use doorcam_network::{HttpConnection, HttpResponse, Result};
use http::StatusCode;
use http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE, EXPIRES, HeaderValue, PRAGMA,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Why a stream session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The peer closed the connection.
    ClientGone,

    /// The camera produced no frame.
    CaptureFailed,

    /// Writing a part to the peer failed.
    WriteFailed,

    /// The endpoint closed the session itself.
    Shutdown,
}

/// Result of one frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Sent,
    Ended(StreamEnd),
}

/// Opens stream sessions with a fixed pacing interval.
#[derive(Debug, Clone, Copy)]
pub struct StreamService {
    frame_interval: Duration,
}

impl StreamService {
    pub fn new(frame_interval: Duration) -> Self {
        Self { frame_interval }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(config.stream_frame_interval())
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Response head sent before the first part.
    pub fn response_head() -> HttpResponse {
        HttpResponse::streaming(StatusCode::OK)
            .header(CONTENT_TYPE, HeaderValue::from_static(STREAM_CONTENT_TYPE))
            .header(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(ALLOW_ANY_ORIGIN),
            )
            .header(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE))
            .header(PRAGMA, HeaderValue::from_static("no-cache"))
            .header(EXPIRES, HeaderValue::from_static("-1"))
    }

    /// Send the response head and start a session.
    ///
    /// On error the connection is dropped.
    pub async fn open(&self, mut connection: HttpConnection) -> Result<StreamSession> {
        connection.respond(&Self::response_head()).await?;
        info!(peer = %connection.peer_addr(), "Stream session opened");

        Ok(StreamSession {
            connection,
            frame_interval: self.frame_interval,
            next_frame_at: Instant::now(),
            frames_sent: 0,
        })
    }

    /// Run a whole session to completion, pacing frames by sleeping.
    pub async fn serve<C: Camera>(
        &self,
        camera: &mut C,
        connection: HttpConnection,
    ) -> Option<StreamEnd> {
        let mut session = match self.open(connection).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to open stream session");
                return None;
            }
        };

        let end = loop {
            tokio::time::sleep_until(session.next_frame_at()).await;
            if let FrameOutcome::Ended(end) = session.send_frame(camera).await {
                break end;
            }
        };

        session.close(end).await;
        Some(end)
    }
}

/// One part: boundary line, part header, image bytes, trailing CRLF.
pub fn encode_part(jpeg: &[u8]) -> BytesMut {
    let mut part = BytesMut::with_capacity(jpeg.len() + 48);
    part.put_slice(b"--");
    part.put_slice(STREAM_BOUNDARY.as_bytes());
    part.put_slice(b"\r\nContent-Type: ");
    part.put_slice(FRAME_CONTENT_TYPE.as_bytes());
    part.put_slice(b"\r\n\r\n");
    part.put_slice(jpeg);
    part.put_slice(b"\r\n");
    part
}

/// Live connection of a streaming client.
#[derive(Debug)]
pub struct StreamSession {
    connection: HttpConnection,
    frame_interval: Duration,
    next_frame_at: Instant,
    frames_sent: u64,
}

impl StreamSession {
    /// When the next frame slot opens.
    pub fn next_frame_at(&self) -> Instant {
        self.next_frame_at
    }

    pub fn is_due(&self) -> bool {
        Instant::now() >= self.next_frame_at
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn peer_addr(&self) -> std::net::SocketAddr {
        self.connection.peer_addr()
    }

    /// Fill one frame slot.
    ///
    /// The frame is released before this returns, whatever the outcome.
    pub async fn send_frame<C: Camera>(&mut self, camera: &mut C) -> FrameOutcome {
        if !self.connection.is_peer_alive() {
            return FrameOutcome::Ended(StreamEnd::ClientGone);
        }

        let lease = match FrameLease::acquire(camera).await {
            Ok(lease) => lease,
            Err(e) => {
                warn!(error = %e, "Stream frame capture failed");
                return FrameOutcome::Ended(StreamEnd::CaptureFailed);
            }
        };

        let part = encode_part(lease.data());
        let written = self.connection.write_all(&part).await;
        let sequence = lease.sequence();
        lease.release();

        if let Err(e) = written {
            debug!(error = %e, sequence, "Stream write failed");
            return FrameOutcome::Ended(StreamEnd::WriteFailed);
        }

        self.frames_sent += 1;
        self.next_frame_at = Instant::now() + self.frame_interval;
        FrameOutcome::Sent
    }

    /// Close the connection.
    pub async fn close(self, end: StreamEnd) {
        let peer = self.connection.peer_addr();
        let frames = self.frames_sent;

        if let Err(e) = self.connection.close().await {
            debug!(peer = %peer, error = %e, "Error closing stream connection");
        }
        info!(peer = %peer, frames, reason = ?end, "Stream session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_part() {
        let part = encode_part(&[0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(
            &part[..],
            b"--frame\r\nContent-Type: image/jpeg\r\n\r\n\xFF\xD8\xFF\xD9\r\n"
        );
    }

    #[test]
    fn test_response_head() {
        let head = StreamService::response_head();
        let headers = head.headers();

        assert_eq!(head.status(), StatusCode::OK);
        assert_eq!(headers.len(), 5);
        assert_eq!(headers[CONTENT_TYPE], "multipart/x-mixed-replace; boundary=frame");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[CACHE_CONTROL], "no-cache, no-store, must-revalidate");
        assert_eq!(headers[PRAGMA], "no-cache");
        assert_eq!(headers[EXPIRES], "-1");
    }

    #[test]
    fn test_response_head_is_open_ended() {
        let encoded = StreamService::response_head().encode();
        let text = std::str::from_utf8(&encoded).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
        assert!(!text.contains("content-length"));
        assert!(!text.contains("connection"));
    }
}
