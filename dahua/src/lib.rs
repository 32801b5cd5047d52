//! # dahua
//!
//! Command gateway for Dahua IP cameras over the CGI HTTP API.
//!
//! ## Features
//!
//! - Typed operations validated against a static schema
//! - HTTP Digest authentication (MD5, MD5-sess, SHA-256) with transparent renewal
//! - Async/await API using Tokio, shareable across tasks
//! - Every call reported as a structured [`Outcome`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use dahua::{Gateway, Operation, RecordMode};
//!
//! #[tokio::main]
//! async fn main() -> dahua::Result<()> {
//!     let gateway = Gateway::builder("192.168.1.108")
//!         .with_credentials("admin", "password")
//!         .build()?;
//!
//!     gateway.execute(&Operation::set_record_mode(RecordMode::Auto)).await?.into_result()?;
//!
//!     let info = gateway.device_info().await?;
//!     println!("{}", info);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod gateway;

#[cfg(test)]
mod testing;

// Re-exports
pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayBuilder};

pub use dahua_core::{Credentials, Failure, Outcome, Reply, SessionState, TransportErrorKind, VendorErrorCode};
pub use dahua_transport::{HttpTransport, RetryPolicy, Transport};
pub use dahua_types::{
    schema, CoaxialTarget, DeviceInfo, FieldValue, InfraredMode, LightingProfile, Operation, OperationKind,
    ProfileMode, RecordMode,
};
