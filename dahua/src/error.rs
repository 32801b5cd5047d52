//! High-level error types

use dahua_transport::Transient;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] dahua_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] dahua_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] dahua_types::Error),

    /// A gateway call did not succeed
    #[error(transparent)]
    Failed(#[from] dahua_core::Failure),

    /// Probe was answered without a digest challenge
    #[error("Device did not ask for digest credentials (HTTP {0})")]
    ChallengeMissing(u16),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Check if the error is a caller contract violation
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::Core(e) => e.is_malformed(),
            Self::Types(_) => true,
            _ => false,
        }
    }
}

impl Transient for Error {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_transient())
    }
}
