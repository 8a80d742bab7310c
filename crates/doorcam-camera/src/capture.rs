//! Single-frame capture relayed to the remote upload service.
//!
//! The remote answer goes back to the caller untouched. An upload that never
//! produced an answer is relayed the same way, as the `200` with an empty
//! body such a call leaves behind.

use bytes::Bytes;
use doorcam_core::EndpointConfig;
use doorcam_core::constants::{
    ALLOW_ANY_ORIGIN, CAPTURE_FAILED_MESSAGE, CAPTURE_RESPONSE_CONTENT_TYPE, UPLOAD_CONTENT_TYPE,
};
use doorcam_hardware::{Camera, FrameLease};
use doorcam_network::{HttpConnection, HttpResponse, RemoteClient, Result};
use http::StatusCode;
use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, HeaderValue};
use tracing::{debug, info, warn};

/// Captures a frame, uploads it and relays the remote answer.
#[derive(Debug, Clone)]
pub struct CaptureService {
    client: RemoteClient,
    upload_url: String,
}

impl CaptureService {
    pub fn new(client: RemoteClient, upload_url: impl Into<String>) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        let client = RemoteClient::new(config.request_timeout())?;
        Ok(Self::new(client, config.upload_url()))
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Build the response for one capture request.
    ///
    /// The frame goes back to the camera before this returns, whether or not
    /// the upload succeeded.
    pub async fn handle<C: Camera>(&self, camera: &mut C) -> HttpResponse {
        let lease = match FrameLease::acquire(camera).await {
            Ok(lease) => lease,
            Err(e) => {
                warn!(error = %e, "Capture failed");
                return HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
                    .body(CAPTURE_FAILED_MESSAGE);
            }
        };

        let sequence = lease.sequence();
        let uploaded = self
            .client
            .post_bytes(&self.upload_url, UPLOAD_CONTENT_TYPE, lease.data().to_vec())
            .await;
        lease.release();

        let (status, body) = match uploaded {
            Ok(remote) => {
                info!(sequence, status = remote.status.as_u16(), "Frame uploaded");
                (remote.status, remote.body)
            }
            Err(e) => {
                warn!(sequence, url = %self.upload_url, error = %e, "Frame upload failed");
                (StatusCode::OK, Bytes::new())
            }
        };

        relay(status, body)
    }

    /// Answer a capture request on `connection` and close it.
    pub async fn serve<C: Camera>(&self, camera: &mut C, mut connection: HttpConnection) {
        let peer = connection.peer_addr();
        let response = self.handle(camera).await;

        if let Err(e) = connection.respond(&response).await {
            warn!(peer = %peer, error = %e, "Failed to send capture response");
        }
        if let Err(e) = connection.close().await {
            debug!(peer = %peer, error = %e, "Error closing capture connection");
        }
    }
}

fn relay(status: StatusCode, body: Bytes) -> HttpResponse {
    HttpResponse::new(status)
        .header(CONTENT_TYPE, HeaderValue::from_static(CAPTURE_RESPONSE_CONTENT_TYPE))
        .header(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ANY_ORIGIN),
        )
        .body(body)
}
