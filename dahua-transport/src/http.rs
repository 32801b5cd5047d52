//! HTTP transport

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, trace};

use dahua_core::constants::headers::{AUTHORIZATION, WWW_AUTHENTICATE};
use dahua_core::constants::{DEFAULT_HTTPS_PORT, DEFAULT_PORT, DEFAULT_TIMEOUT};
use dahua_core::EncodedRequest;

use crate::{error::*, Response, Transport};

/// HTTP(S) transport for Dahua devices
///
/// Sends each request exactly once. Retrying belongs to the caller, which
/// has to sign every attempt anew.
pub struct HttpTransport {
    host: String,
    port: u16,
    https: bool,
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a plain HTTP transport
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            https: false,
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
        }
    }

    /// Create an HTTPS transport
    ///
    /// Cameras usually ship self-signed certificates, hence the opt-in
    /// `accept_invalid_certs`.
    pub fn https(host: impl Into<String>, port: u16, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build TLS client: {}", e)))?;

        Ok(Self {
            host: host.into(),
            port,
            https: true,
            client,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
        })
    }

    /// Set per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn base_url(&self) -> String {
        let (scheme, default_port) = if self.https {
            ("https", DEFAULT_HTTPS_PORT)
        } else {
            ("http", DEFAULT_PORT)
        };

        // IPv6 literals need brackets in the authority
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        if self.port == default_port {
            format!("{}://{}", scheme, host)
        } else {
            format!("{}://{}:{}", scheme, host, self.port)
        }
    }

    fn url(&self, request: &EncodedRequest) -> Result<Url> {
        let url = format!("{}{}", self.base_url(), request.uri());
        Url::parse(&url).map_err(|e| Error::InvalidAddress(format!("{}: {}", url, e)))
    }

    /// Map a reqwest failure onto a transport error
    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            return Error::Timeout(self.timeout);
        }

        let detail = error_chain(&err);

        if let Some(io_err) = find_io_error(&err) {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return Error::ConnectionRefused(detail),
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => return Error::ConnectionReset(detail),
                io::ErrorKind::TimedOut => return Error::Timeout(self.timeout),
                _ => {}
            }
        }

        let lower = detail.to_lowercase();
        if lower.contains("dns error") || lower.contains("failed to lookup address") {
            Error::Dns(detail)
        } else if err.is_builder() {
            Error::InvalidAddress(detail)
        } else if err.is_connect() {
            Error::ConnectionRefused(detail)
        } else if err.is_body() || err.is_request() {
            Error::ConnectionReset(detail)
        } else {
            Error::Http(detail)
        }
    }
}

/// Path and query of a parsed URL, as written on the request line
fn wire_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &EncodedRequest, authorization: Option<&str>) -> Result<Response> {
        let url = self.url(request)?;
        debug!("{} {}", request.method(), url);

        let mut builder = self.client.get(url).timeout(self.timeout);
        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let www_authenticate = response
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        trace!("Received {} ({} bytes)", status, body.len());

        Ok(Response {
            status,
            www_authenticate,
            body,
        })
    }

    fn request_uri(&self, request: &EncodedRequest) -> Result<String> {
        self.url(request).map(|url| wire_uri(&url))
    }

    fn remote_addr(&self) -> String {
        self.base_url()
    }
}

/// Render an error and all of its sources
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        detail.push_str(": ");
        detail.push_str(&e.to_string());
        source = e.source();
    }
    detail
}

fn find_io_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a io::Error> {
    let mut source = err.source();
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        source = e.source();
    }
    None
}
