//! Tokio codec for HTTP/1.x request heads.
//!
//! The endpoint only ever answers bodiless `GET`s, so the codec stops at the
//! blank line that ends the head. Parsing is done by [`httparse`]; the codec
//! adds buffering, the size limit and the conversion into [`RequestHead`].
//!
//! # DoS Protection
//!
//! Heads larger than the configured limit are rejected as soon as the buffer
//! grows past it, without waiting for the terminator.

use bytes::{Buf, BytesMut};
use doorcam_core::constants::MAX_REQUEST_HEAD_SIZE;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Version};
use tokio_util::codec::Decoder;

use crate::error::{NetworkError, Result};

/// Header slots offered to the parser; more is a malformed request.
const MAX_HEADERS: usize = 32;

/// Parsed request line and headers.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,

    /// Request target without the query string.
    pub path: String,

    pub query: Option<String>,
    pub version: Version,
    pub headers: HeaderMap,
}

impl RequestHead {
    /// First value of a header, if it is visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn from_parsed(request: &httparse::Request<'_, '_>) -> Result<Self> {
        let malformed = |what: &str| NetworkError::MalformedRequest(what.to_string());

        let method = request
            .method
            .ok_or_else(|| malformed("missing method"))
            .and_then(|m| Method::from_bytes(m.as_bytes()).map_err(|_| malformed("bad method")))?;

        let target = request.path.ok_or_else(|| malformed("missing target"))?;
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };

        let version = match request.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            _ => return Err(malformed("unsupported protocol version")),
        };

        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for header in request.headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|_| malformed("bad header name"))?;
            let value =
                HeaderValue::from_bytes(header.value).map_err(|_| malformed("bad header value"))?;
            headers.append(name, value);
        }

        Ok(Self {
            method,
            path,
            query,
            version,
            headers,
        })
    }
}

/// Decoder producing one [`RequestHead`] per request.
#[derive(Debug)]
pub struct HttpRequestCodec {
    max_head_size: usize,
}

impl HttpRequestCodec {
    /// Codec with the default head size limit.
    pub fn new() -> Self {
        Self::with_max_head_size(MAX_REQUEST_HEAD_SIZE)
    }

    /// Codec with a custom head size limit.
    pub fn with_max_head_size(max_head_size: usize) -> Self {
        Self { max_head_size }
    }

    pub fn max_head_size(&self) -> usize {
        self.max_head_size
    }
}

impl Default for HttpRequestCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for HttpRequestCodec {
    type Item = RequestHead;
    type Error = NetworkError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let mut slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut request = httparse::Request::new(&mut slots);

        let head_len = match request.parse(&src[..]) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => {
                if src.len() > self.max_head_size {
                    return Err(NetworkError::HeadTooLarge {
                        max_size: self.max_head_size,
                    });
                }
                return Ok(None);
            }
            Err(e) => return Err(NetworkError::MalformedRequest(e.to_string())),
        };

        if head_len > self.max_head_size {
            return Err(NetworkError::HeadTooLarge {
                max_size: self.max_head_size,
            });
        }

        let head = RequestHead::from_parsed(&request)?;
        src.advance(head_len);
        Ok(Some(head))
    }
}
