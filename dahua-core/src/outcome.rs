//! Results of a gateway call

use std::collections::BTreeMap;
use std::fmt;

use crate::constants::TABLE_PREFIX;

/// Why a request never produced a device reply
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    Timeout,
    Refused,
    Reset,
    Dns,

    /// TLS, malformed HTTP, or anything else below the CGI layer
    Protocol,
}

impl TransportErrorKind {
    /// Check if a retry might succeed
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Refused | Self::Reset)
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::Refused => "connection refused",
            Self::Reset => "connection reset",
            Self::Dns => "dns lookup failed",
            Self::Protocol => "protocol error",
        })
    }
}

/// Stable classification of device-side rejections
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VendorErrorCode {
    /// Unknown table, bad index or bad value
    BadRequest,

    /// Account lacks the right for this command
    InvalidAuthority,

    /// Command not supported by this firmware
    NotImplemented,

    /// Device accepted the command but could not persist it
    SaveFailed,

    Unknown,
}

impl VendorErrorCode {
    /// Classify a device error message
    pub fn classify(message: &str) -> Self {
        let message = message.to_ascii_lowercase();

        if message.contains("bad request") {
            Self::BadRequest
        } else if message.contains("invalid authority")
            || message.contains("no authority")
            || message.contains("forbidden")
        {
            Self::InvalidAuthority
        } else if message.contains("not implemented")
            || message.contains("not support")
            || message.contains("method not allowed")
        {
            Self::NotImplemented
        } else if message.contains("save") && message.contains("fail") {
            Self::SaveFailed
        } else {
            Self::Unknown
        }
    }

    /// Classify from the HTTP status alone
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 | 403 => Self::InvalidAuthority,
            404 | 405 | 501 => Self::NotImplemented,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for VendorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BadRequest => "bad request",
            Self::InvalidAuthority => "invalid authority",
            Self::NotImplemented => "not implemented",
            Self::SaveFailed => "save failed",
            Self::Unknown => "unknown",
        })
    }
}

/// `key=value` lines returned by a read command, in device order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    entries: Vec<(String, String)>,
}

impl Reply {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Look up a key, with or without the `table.` prefix
    ///
    /// `get("RecordMode[0].Mode")` finds `table.RecordMode[0].Mode`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key || k.strip_prefix(TABLE_PREFIX) == Some(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries keyed without the `table.` prefix
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| {
                let key = k.strip_prefix(TABLE_PREFIX).unwrap_or(k);
                (key.to_string(), v.clone())
            })
            .collect()
    }
}

/// Terminal result of one gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Command accepted; reads carry the returned values
    Success(Option<Reply>),

    /// Device rejected the command; the message is kept verbatim
    VendorError {
        code: VendorErrorCode,
        message: String,
    },

    TransportError(TransportErrorKind),

    /// Credentials rejected after the one re-authentication attempt
    AuthError,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Self::Success(reply) => reply.as_ref(),
            _ => None,
        }
    }

    /// Convert to a `Result` for callers that propagate with `?`
    pub fn into_result(self) -> Result<Option<Reply>, Failure> {
        match self {
            Self::Success(reply) => Ok(reply),
            Self::VendorError { code, message } => Err(Failure::Vendor { code, message }),
            Self::TransportError(kind) => Err(Failure::Transport(kind)),
            Self::AuthError => Err(Failure::Auth),
        }
    }
}

/// The failing arms of [`Outcome`] as an error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("Device rejected command ({code}): {message}")]
    Vendor {
        code: VendorErrorCode,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(TransportErrorKind),

    #[error("Authentication failed - device rejected the credentials")]
    Auth,
}
