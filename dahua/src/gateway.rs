//! High-level gateway interface

use std::time::Duration;

use tracing::{debug, trace, warn};

use dahua_core::constants::{DEFAULT_HTTPS_PORT, DEFAULT_PORT, DEFAULT_TIMEOUT};
use dahua_core::{parse_response, Credentials, EncodedRequest, Encoder, Failure, Outcome, Reply, SessionState};
use dahua_transport::{HttpTransport, RetryPolicy, Transport};
use dahua_types::{DeviceInfo, Operation};

use crate::auth::{Authenticator, Exchange};
use crate::error::{Error, Result};

/// Dahua camera gateway
///
/// Turns [`Operation`]s into authenticated CGI requests and reports each
/// call as an [`Outcome`]. One gateway owns one digest session; it is
/// `Send + Sync` and meant to be shared behind an `Arc`.
///
/// # Examples
///
/// ```no_run
/// use dahua::{Gateway, InfraredMode, Operation};
///
/// #[tokio::main]
/// async fn main() -> dahua::Result<()> {
///     let gateway = Gateway::builder("192.168.1.108")
///         .with_credentials("admin", "password")
///         .build()?;
///
///     let outcome = gateway
///         .execute(&Operation::set_infrared_mode(InfraredMode::Auto, 80))
///         .await?;
///     println!("{:?}", outcome);
///
///     println!("{}", gateway.device_info().await?);
///     Ok(())
/// }
/// ```
pub struct Gateway {
    transport: Box<dyn Transport>,
    auth: Authenticator,
    encoder: Encoder,
}

impl Gateway {
    /// Start configuring a gateway for `host`
    pub fn builder(host: impl Into<String>) -> GatewayBuilder {
        GatewayBuilder::new(host)
    }

    /// Create a gateway over an existing transport
    pub fn with_transport(transport: impl Transport + 'static, credentials: Credentials) -> Self {
        Self {
            transport: Box::new(transport),
            auth: Authenticator::new(credentials),
            encoder: Encoder::new(),
        }
    }

    /// Reject channels at or above `count`
    pub fn with_channel_count(mut self, count: u32) -> Self {
        self.encoder = self.encoder.with_channel_count(count);
        self
    }

    /// Set retry policy for transient network failures
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.auth = self.auth.with_retry(retry);
        self
    }

    /// Execute one operation
    ///
    /// # Errors
    ///
    /// Only a malformed operation is an error; nothing is sent in that
    /// case. Every other result, including transport and authentication
    /// failures, is an [`Outcome`].
    ///
    /// Operations with a legacy encoding are resent in that form once if
    /// the device answers the first request with a vendor error.
    pub async fn execute(&self, operation: &Operation) -> Result<Outcome> {
        let request = self.encoder.encode(operation)?;
        debug!("Executing {} as {}", operation.kind(), request.command);

        let mut outcome = self.dispatch(&request).await;
        if matches!(outcome, Outcome::VendorError { .. }) {
            if let Some(legacy) = self.encoder.fallback(operation)? {
                debug!("{} rejected, retrying with legacy encoding", operation.kind());
                outcome = self.dispatch(&legacy).await;
            }
        }
        if !outcome.is_success() {
            debug!("{} finished with {:?}", operation.kind(), outcome);
        }
        Ok(outcome)
    }

    /// Authenticated send with at most one re-authentication
    async fn dispatch(&self, request: &EncodedRequest) -> Outcome {
        let mut reauthenticated = false;

        loop {
            match self.auth.send(self.transport.as_ref(), request).await {
                Ok(Exchange::Reply(response)) => {
                    trace!("Reply {}: {:?}", response.status, String::from_utf8_lossy(&response.body));
                    return parse_response(response.status, &response.body);
                }
                Ok(Exchange::Rejected) if !reauthenticated => {
                    debug!("Re-authenticating for {}", request.command);
                    reauthenticated = true;
                }
                Ok(Exchange::Rejected) => {
                    warn!("Authentication failed for {}", request.command);
                    return Outcome::AuthError;
                }
                Err(Error::Transport(e)) => {
                    warn!("{} failed: {}", request.command, e);
                    return Outcome::TransportError(e.kind());
                }
                Err(e) => {
                    warn!("Challenge round failed: {}", e);
                    return Outcome::AuthError;
                }
            }
        }
    }

    /// Get device information
    ///
    /// Combines `getSystemInfo` and `getSoftwareVersion` with the optional
    /// `getMachineName` and `getVendor`, which some firmware rejects.
    pub async fn device_info(&self) -> Result<DeviceInfo> {
        let system = self.read(&Operation::get_system_info()).await?;
        let software = self.read(&Operation::get_software_version()).await?;

        let (firmware_version, build_date) = software
            .get("version")
            .map(DeviceInfo::parse_software_version)
            .unwrap_or_default();

        let owned = |key: &str| system.get(key).map(str::to_string);

        let mut info = DeviceInfo::new(
            system.get("serialNumber").unwrap_or_default().to_string(),
            firmware_version,
        );
        info.build_date = build_date;
        info.device_type = owned("deviceType");
        info.hardware_version = owned("hardwareVersion");
        info.processor = owned("processor");
        info.machine_name = self.read_optional(&Operation::get_machine_name(), "name").await?;
        info.vendor = self.read_optional(&Operation::get_vendor(), "vendor").await?;

        debug!("Device info: {}", info);
        Ok(info)
    }

    async fn read(&self, operation: &Operation) -> Result<Reply> {
        Ok(self.execute(operation).await?.into_result()?.unwrap_or_default())
    }

    async fn read_optional(&self, operation: &Operation, key: &str) -> Result<Option<String>> {
        match self.read(operation).await {
            Ok(reply) => Ok(reply.get(key).map(str::to_string)),
            Err(Error::Failed(Failure::Vendor { code, .. })) => {
                debug!("{} not available: {}", operation.kind(), code);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.auth.state()
    }

    /// Number of digest challenge rounds performed so far
    pub fn challenge_rounds(&self) -> u64 {
        self.auth.challenge_rounds()
    }

    pub fn remote_addr(&self) -> String {
        self.transport.remote_addr()
    }

    /// Forget the current session; the next call starts a new challenge round
    pub fn close(&self) {
        self.auth.session().close();
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayBuilder {
    host: String,
    port: Option<u16>,
    https: bool,
    credentials: Option<Credentials>,
    timeout: Duration,
    retry: RetryPolicy,
    accept_invalid_certs: bool,
    channel_count: Option<u32>,
}

impl GatewayBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            https: false,
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
            retry: RetryPolicy::default(),
            accept_invalid_certs: false,
            channel_count: None,
        }
    }

    /// Set port (default: 80, or 443 with HTTPS)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Set per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Accept self-signed certificates over HTTPS
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_channel_count(mut self, count: u32) -> Self {
        self.channel_count = Some(count);
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }
        let credentials = self
            .credentials
            .ok_or_else(|| Error::Config("credentials are required".into()))?;

        let transport = if self.https {
            let port = self.port.unwrap_or(DEFAULT_HTTPS_PORT);
            HttpTransport::https(host, port, self.accept_invalid_certs)?
        } else {
            HttpTransport::new(host, self.port.unwrap_or(DEFAULT_PORT))
        };
        let transport = transport.with_timeout(self.timeout);

        let gateway = Gateway::with_transport(transport, credentials).with_retry(self.retry);
        Ok(match self.channel_count {
            Some(count) => gateway.with_channel_count(count),
            None => gateway,
        })
    }
}
