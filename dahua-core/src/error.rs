//! Error types for dahua-core

/// Result type alias for dahua-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Operation failed the manifest contract (caller bug, never retried)
    #[error("Malformed operation: {0}")]
    MalformedOperation(#[from] dahua_types::Error),

    /// Channel index beyond what this camera exposes
    #[error("Malformed operation: channel {channel} is not below the configured channel count {count}")]
    ChannelOutOfRange { channel: i64, count: u32 },

    /// Unknown CGI action
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// `WWW-Authenticate` header could not be used
    #[error("Invalid digest challenge: {0}")]
    InvalidChallenge(String),

    /// Digest algorithm not supported
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

impl Error {
    /// Check if the error is a caller contract violation
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedOperation(_) | Self::ChannelOutOfRange { .. }
        )
    }
}
