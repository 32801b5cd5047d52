//! HTTP Digest authentication (RFC 2617 / RFC 7616)
//!
//! Dahua cameras protect every CGI with digest authentication. The device
//! answers an unauthenticated request with `401` and a challenge:
//!
//! ```text
//! WWW-Authenticate: Digest realm="Login to 4X7C5A1ZAG21L3F", qop="auth",
//!                   nonce="1402825044", opaque="ea2ef5cd8c05d7a3ad308b4d5b0f2d2f"
//! ```
//!
//! Each subsequent request proves knowledge of the password with
//!
//! ```text
//! HA1      = H(username:realm:password)          (MD5-sess: H(HA1:nonce:cnonce))
//! HA2      = H(method:uri)
//! response = H(HA1:nonce:nc:cnonce:qop:HA2)      (no qop: H(HA1:nonce:HA2))
//! ```

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Camera login
///
/// The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Digest hash algorithm
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    #[default]
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
            Self::Sha256 => "SHA-256",
            Self::Sha256Sess => "SHA-256-sess",
        }
    }

    fn is_session(self) -> bool {
        matches!(self, Self::Md5Sess | Self::Sha256Sess)
    }

    /// Lowercase hex digest of `data`
    pub fn hash(self, data: &str) -> String {
        match self {
            Self::Md5 | Self::Md5Sess => hex::encode(Md5::digest(data.as_bytes())),
            Self::Sha256 | Self::Sha256Sess => hex::encode(Sha256::digest(data.as_bytes())),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Md5, Self::Md5Sess, Self::Sha256, Self::Sha256Sess]
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedAlgorithm(s.to_string()))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed `WWW-Authenticate: Digest` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub algorithm: Algorithm,

    /// Server offered `qop=auth`
    pub qop_auth: bool,

    /// Server flagged the previous nonce as stale (credentials were fine)
    pub stale: bool,
}

impl DigestChallenge {
    /// Parse a single `WWW-Authenticate` header value
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();
        let (scheme, rest) = header
            .split_once(char::is_whitespace)
            .unwrap_or((header, ""));

        if !scheme.eq_ignore_ascii_case("digest") {
            return Err(Error::InvalidChallenge(format!(
                "expected a Digest challenge, got '{scheme}'"
            )));
        }

        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut algorithm = Algorithm::default();
        let mut qop = None;
        let mut stale = false;

        for (key, value) in parse_params(rest) {
            match key.as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "opaque" => opaque = Some(value),
                "algorithm" => algorithm = value.parse()?,
                "qop" => qop = Some(value),
                "stale" => stale = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        let qop_auth = match qop {
            None => false,
            Some(list) if list.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")) => true,
            Some(list) => {
                return Err(Error::InvalidChallenge(format!("unsupported qop '{list}'")));
            }
        };

        Ok(Self {
            realm: realm.ok_or_else(|| Error::InvalidChallenge("missing realm".into()))?,
            nonce: nonce.ok_or_else(|| Error::InvalidChallenge("missing nonce".into()))?,
            opaque,
            algorithm,
            qop_auth,
            stale,
        })
    }

    /// Pick the first usable digest challenge out of several headers
    pub fn from_headers<'a, I>(headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut last_error = Error::InvalidChallenge("no WWW-Authenticate header".into());
        for header in headers {
            match Self::parse(header) {
                Ok(challenge) => return Ok(challenge),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    /// Compute the `response` digest
    pub fn response(
        &self,
        credentials: &Credentials,
        method: &str,
        uri: &str,
        nc: u32,
        cnonce: &str,
    ) -> String {
        let h = |data: String| self.algorithm.hash(&data);

        let mut ha1 = h(format!(
            "{}:{}:{}",
            credentials.username, self.realm, credentials.password
        ));
        if self.algorithm.is_session() {
            ha1 = h(format!("{ha1}:{}:{cnonce}", self.nonce));
        }
        let ha2 = h(format!("{method}:{uri}"));

        if self.qop_auth {
            h(format!("{ha1}:{}:{nc:08x}:{cnonce}:auth:{ha2}", self.nonce))
        } else {
            h(format!("{ha1}:{}:{ha2}", self.nonce))
        }
    }

    /// Build the `Authorization` header value for one request
    pub fn authorize(
        &self,
        credentials: &Credentials,
        method: &str,
        uri: &str,
        nc: u32,
        cnonce: &str,
    ) -> String {
        let response = self.response(credentials, method, uri, nc, cnonce);

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", algorithm={}, response=\"{}\"",
            quote(&credentials.username),
            quote(&self.realm),
            quote(&self.nonce),
            quote(uri),
            self.algorithm,
            response,
        );
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{}\"", quote(opaque)));
        }
        if self.qop_auth {
            header.push_str(&format!(", qop=auth, nc={nc:08x}, cnonce=\"{}\"", quote(cnonce)));
        }
        header
    }
}

/// Random client nonce
pub fn generate_cnonce() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

/// Parse `key=value, key="quoted, value"` auth parameters
///
/// Keys are lowercased. Quoted values may contain commas and backslash
/// escapes. Malformed trailing input is ignored.
pub fn parse_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}

        let key: String = std::iter::from_fn(|| chars.next_if(|c| *c != '=' && *c != ','))
            .collect();
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            break;
        }
        if chars.next_if_eq(&'=').is_none() {
            // bare token without a value
            params.push((key, String::new()));
            continue;
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let value = if chars.next_if_eq(&'"').is_some() {
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    c => value.push(c),
                }
            }
            value
        } else {
            let value: String = std::iter::from_fn(|| chars.next_if(|c| *c != ',')).collect();
            value.trim().to_string()
        };

        params.push((key, value));
    }

    params
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
