//! Encoded CGI requests
//!
//! # Request-URI
//!
//! ```text
//! /cgi-bin/configManager.cgi?action=setConfig&VideoWidget[0].TimeTitle.EncodeBlend=true
//! └──────── cgi path ──────┘ └──── action ───┘ └────────── ordered key=value ─────────┘
//! ```
//!
//! Keys are built from trusted table paths and sent verbatim (the brackets
//! are part of the protocol). Values are percent-encoded. The rendered URI
//! is used both on the request line and in the digest computation, so
//! every character a URL parser would rewrite in a query is escaped here.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::command::Command;

/// Characters escaped in parameter values
const VALUE_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A command ready to be signed and sent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedRequest {
    /// Protocol command
    pub command: Command,

    /// Parameters after `action=`, in wire order
    pub params: Vec<(String, String)>,
}

impl EncodedRequest {
    /// Create a request with no parameters
    pub fn new(command: Command) -> Self {
        Self {
            command,
            params: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Request used to obtain a fresh digest challenge
    ///
    /// A harmless read, so nothing changes on the device if it happens to
    /// answer without asking for credentials.
    pub fn probe() -> Self {
        Self::new(Command::GetDeviceType)
    }

    /// HTTP method; every CGI command is a GET
    pub fn method(&self) -> &'static str {
        "GET"
    }

    /// Look up a parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the request-URI (path and query)
    pub fn uri(&self) -> String {
        let mut uri = format!("{}?action={}", self.command.cgi().path(), self.command.name());
        for (key, value) in &self.params {
            uri.push('&');
            uri.push_str(key);
            uri.push('=');
            uri.extend(utf8_percent_encode(value, VALUE_ENCODE_SET));
        }
        uri
    }
}

impl fmt::Display for EncodedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.uri())
    }
}
