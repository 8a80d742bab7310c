//! HTTP/1.1 responses for the local listeners.
//!
//! [`HttpResponse`] wraps an [`http::Response`] with a [`Bytes`] body.
//! Responses are written once and the connection is closed afterwards, so
//! every fixed-length response carries `connection: close`. A streaming
//! response omits `content-length` and leaves the body to the caller.

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Response to one local request.
///
/// # Examples
///
/// ```
/// use doorcam_network::HttpResponse;
/// use http::StatusCode;
/// use http::header::{CONTENT_TYPE, HeaderValue};
///
/// let response = HttpResponse::new(StatusCode::OK)
///     .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
///     .body(r#"{"status":"ok"}"#);
///
/// let encoded = response.encode();
/// assert!(encoded.starts_with(b"HTTP/1.1 200 OK\r\n"));
/// assert!(encoded.ends_with(br#"{"status":"ok"}"#));
/// ```
#[derive(Debug)]
pub struct HttpResponse {
    inner: Response<Bytes>,
    streaming: bool,
}

impl HttpResponse {
    /// Empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        let mut inner = Response::new(Bytes::new());
        *inner.status_mut() = status;
        Self {
            inner,
            streaming: false,
        }
    }

    /// Head of an open-ended response whose body the caller writes itself.
    pub fn streaming(status: StatusCode) -> Self {
        Self {
            streaming: true,
            ..Self::new(status)
        }
    }

    /// `404` naming the path that was asked for.
    pub fn not_found(path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .body(format!("Not found: {path}"))
    }

    /// Append a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.inner.headers_mut().append(name, value);
        self
    }

    /// Set the body. Ignored for streaming responses.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        *self.inner.body_mut() = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn body_bytes(&self) -> &Bytes {
        self.inner.body()
    }

    /// Serialize head and body.
    pub fn encode(&self) -> BytesMut {
        let status = self.inner.status();
        let body = self.inner.body();
        let mut buf = BytesMut::with_capacity(128 + body.len());

        buf.put_slice(b"HTTP/1.1 ");
        buf.put_slice(status.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(status.canonical_reason().unwrap_or("").as_bytes());
        buf.put_slice(b"\r\n");

        let mut framing = HeaderMap::new();
        if !self.streaming {
            framing.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
            framing.insert(CONNECTION, HeaderValue::from_static("close"));
        }

        for (name, value) in self.inner.headers().iter().chain(framing.iter()) {
            buf.put_slice(name.as_str().as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"\r\n");

        if !self.streaming {
            buf.put_slice(body);
        }
        buf
    }

    /// Write the encoded response and flush.
    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.encode()).await?;
        writer.flush().await
    }
}
