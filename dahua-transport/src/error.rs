//! Transport errors

use std::time::Duration;

use dahua_core::TransportErrorKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("Connection reset by remote: {0}")]
    ConnectionReset(String),

    #[error("DNS lookup failed: {0}")]
    Dns(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            Self::Timeout(_) => TransportErrorKind::Timeout,
            Self::ConnectionRefused(_) => TransportErrorKind::Refused,
            Self::ConnectionReset(_) => TransportErrorKind::Reset,
            Self::Dns(_) => TransportErrorKind::Dns,
            Self::InvalidAddress(_) | Self::Http(_) => TransportErrorKind::Protocol,
        }
    }

    /// Check if a retry might succeed
    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
