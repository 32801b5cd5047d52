//! # dahua-core
//!
//! Core protocol implementation for Dahua IP cameras.
//!
//! This crate provides the I/O-free protocol pieces:
//! - Operation to CGI request encoding
//! - HTTP Digest challenge parsing and request signing
//! - Session state tracking
//! - Reply parsing into a structured [`Outcome`]

pub mod auth;
pub mod command;
pub mod constants;
pub mod encoder;
pub mod error;
pub mod outcome;
pub mod request;
pub mod response;
pub mod session;

pub use auth::{Credentials, DigestChallenge};
pub use command::{Cgi, Command};
pub use encoder::{encode, Encoder};
pub use error::{Error, Result};
pub use outcome::{Failure, Outcome, Reply, TransportErrorKind, VendorErrorCode};
pub use request::EncodedRequest;
pub use response::{parse, parse_response};
pub use session::{Session, SessionState, Signature};

/// Protocol version information
pub const PROTOCOL_VERSION: &str = "HTTP API 2.76";

pub use constants::DEFAULT_PORT;
