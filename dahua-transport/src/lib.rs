//! Transport layer for the Dahua HTTP API
//!
//! Sends encoded CGI requests over HTTP(S) and hands back the raw reply.

pub mod error;
pub mod http;
pub mod retry;

pub use error::{Error, Result};
pub use http::HttpTransport;
pub use retry::{RetryPolicy, Transient};

use async_trait::async_trait;
use bytes::Bytes;

use dahua_core::EncodedRequest;

/// Raw device reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Every `WWW-Authenticate` header value, in order
    pub www_authenticate: Vec<String>,

    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            www_authenticate: Vec::new(),
            body: body.into(),
        }
    }

    /// `401` with the given challenge
    pub fn unauthorized(challenge: impl Into<String>) -> Self {
        Self {
            status: 401,
            www_authenticate: vec![challenge.into()],
            body: Bytes::new(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Transport trait for different communication methods
///
/// Implementations take `&self` so that independent requests can be in
/// flight at the same time.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request, optionally with an `Authorization` header
    ///
    /// Any HTTP status is a successful send; only failures to obtain a
    /// reply are errors.
    async fn send(&self, request: &EncodedRequest, authorization: Option<&str>) -> Result<Response>;

    /// Request-URI exactly as it will appear on the request line
    ///
    /// Digest responses are computed over this string. Transports that
    /// normalize the URI before writing it must report the normalized form.
    fn request_uri(&self, request: &EncodedRequest) -> Result<String> {
        Ok(request.uri())
    }

    /// Get remote address
    fn remote_addr(&self) -> String;
}
