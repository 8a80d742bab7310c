//! Network layer for the doorcam endpoint.
//!
//! # Components
//!
//! - **HttpRequestCodec**: Tokio decoder for request heads, parsed with
//!   `httparse`
//! - **HttpListener / HttpConnection**: local listeners for the stream and
//!   capture endpoints
//! - **HttpResponse**: `http::Response` heads and fixed bodies
//! - **RemoteClient**: outbound POSTs to the authorization/upload service
//!
//! # Example
//!
//! ```no_run
//! use doorcam_network::RemoteClient;
//! use std::time::Duration;
//!
//! # async fn example() -> doorcam_network::Result<()> {
//! let client = RemoteClient::new(Duration::from_secs(5))?;
//! let response = client
//!     .post_json("http://192.168.40.1:5000/api/send_uuid", &serde_json::json!({"uuid": "0AFF"}))
//!     .await?;
//! println!("{} {}", response.status, response.text());
//! # Ok(())
//! # }
//! ```

mod client;
mod codec;
mod error;
mod listener;
mod response;

pub use client::{RemoteClient, RemoteResponse};
pub use codec::{HttpRequestCodec, RequestHead};
pub use error::{NetworkError, Result};
pub use listener::{HttpConnection, HttpListener};
pub use response::HttpResponse;
