//! Remote authorization of scanned credentials.
//!
//! The verdict contract is deliberately narrow: a success status and the
//! literal [`SUCCESS_MARKER`](doorcam_core::constants::SUCCESS_MARKER) in
//! the body approve, everything else denies. Authorization never fails;
//! transport problems come back as a denied [`Verdict`].

#![allow(async_fn_in_trait)]

use doorcam_core::{CredentialId, EndpointConfig, Verdict};
use doorcam_network::RemoteClient;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Source of authorization verdicts.
pub trait Authorizer {
    /// Ask whether the credential may open the door.
    async fn authorize(&self, id: &CredentialId) -> Verdict;
}

/// Body of the authorization request.
#[derive(Debug, Serialize)]
struct UidPayload<'a> {
    uuid: &'a str,
}

/// Authorizer backed by the remote `send_uuid` endpoint.
#[derive(Debug, Clone)]
pub struct HttpAuthorizer {
    client: RemoteClient,
    url: String,
}

impl HttpAuthorizer {
    pub fn new(client: RemoteClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Authorizer for the configured remote service and request timeout.
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        let client = RemoteClient::new(config.request_timeout())?;
        Ok(Self::new(client, config.send_uuid_url()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Authorizer for HttpAuthorizer {
    async fn authorize(&self, id: &CredentialId) -> Verdict {
        let payload = UidPayload { uuid: id.as_str() };
        debug!(uid = %id, url = %self.url, "Sending UID for authorization");

        match self.client.post_json(&self.url, &payload).await {
            Ok(response) => {
                let verdict = Verdict::from_response(response.status.as_u16(), response.text());
                info!(
                    uid = %id,
                    status = response.status.as_u16(),
                    body = %verdict.payload(),
                    "Authorization response"
                );
                verdict
            }
            Err(e) => {
                warn!(uid = %id, error = %e, timeout = e.is_timeout(), "Authorization request failed");
                Verdict::transport_failure(e.to_string())
            }
        }
    }
}
