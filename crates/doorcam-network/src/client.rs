//! HTTP client for the remote authorization and upload service.
//!
//! A thin layer over [`reqwest::Client`] that hands back the raw status and
//! body bytes. Interpreting them (verdicts, relaying) is the caller's job.
//!
//! # Design Principles
//!
//! - **No automatic retry**: a failed scan is simply denied
//! - **One timeout for everything**: connect, send and read share the
//!   configured budget
//! - **Transport errors are errors**: any HTTP status, including 5xx, is a
//!   successful round trip

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::Result;

/// Status and body of a completed remote round trip.
///
/// The body is kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RemoteResponse {
    /// Body as text, invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Client for the remote service.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
}

impl RemoteClient {
    /// Build a client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { http })
    }

    /// POST a JSON document.
    pub async fn post_json<T>(&self, url: &str, payload: &T) -> Result<RemoteResponse>
    where
        T: Serialize + ?Sized,
    {
        debug!(url, "POST json");
        let response = self.http.post(url).json(payload).send().await?;
        Self::collect(response).await
    }

    /// POST an opaque byte payload.
    pub async fn post_bytes(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<RemoteResponse> {
        debug!(url, bytes = body.len(), "POST bytes");
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        Self::collect(response).await
    }

    async fn collect(response: reqwest::Response) -> Result<RemoteResponse> {
        let status = response.status();
        let body = response.bytes().await?;
        trace!(status = status.as_u16(), bytes = body.len(), "Remote response");
        Ok(RemoteResponse { status, body })
    }
}
