//! Digest session state
//!
//! A session tracks:
//! - the current digest challenge (realm, nonce, opaque, algorithm)
//! - the nonce counter (`nc`, increments per signed request)
//! - the authentication state
//! - a generation number, bumped every time a new challenge is installed
//!
//! ```text
//! Unauthenticated ──challenge──▶ Challenged ──confirm──▶ Authenticated
//!        ▲                           │                        │
//!        └───────invalidate──────────┴────────────────────────┤
//!                                                             │ expire (stale nonce)
//!  Expired ◀──────────────────────────────────────────────────┘
//!     └──challenge──▶ Challenged
//! ```
//!
//! Invalidation is keyed on the generation a caller signed with, so a
//! failure observed on an old nonce never tears down a session that another
//! caller has already renewed.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::auth::{Credentials, DigestChallenge};
use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No challenge known
    Unauthenticated,

    /// Challenge received, no signed request confirmed yet
    Challenged,

    /// A signed request was accepted
    Authenticated,

    /// Device reported the nonce as stale
    Expired,
}

/// Authorization material for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// `Authorization` header value
    pub authorization: String,

    /// Session generation the header was computed for
    pub generation: u64,
}

/// Session manager
///
/// Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Nonce counter for the current challenge
    nonce_count: AtomicU32,

    state: parking_lot::RwLock<SessionData>,
}

#[derive(Debug)]
struct SessionData {
    state: SessionState,
    challenge: Option<DigestChallenge>,
    generation: u64,
}

impl Session {
    /// Create a new unauthenticated session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                nonce_count: AtomicU32::new(0),
                state: parking_lot::RwLock::new(SessionData {
                    state: SessionState::Unauthenticated,
                    challenge: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.inner.state.read().state
    }

    /// Generation of the current challenge (0 before the first one)
    pub fn generation(&self) -> u64 {
        self.inner.state.read().generation
    }

    /// Check if authenticated
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated)
    }

    /// Check if a challenge round is needed before signing
    pub fn needs_renewal(&self) -> bool {
        matches!(
            self.state(),
            SessionState::Unauthenticated | SessionState::Expired
        )
    }

    /// Number of requests signed with the current challenge
    pub fn nonce_count(&self) -> u32 {
        self.inner.nonce_count.load(Ordering::Acquire)
    }

    /// Install a fresh challenge
    ///
    /// Returns the new generation.
    pub fn challenge(&self, challenge: DigestChallenge) -> Result<u64> {
        let mut data = self.inner.state.write();

        if !matches!(
            data.state,
            SessionState::Unauthenticated | SessionState::Expired
        ) {
            return Err(Error::InvalidSessionState(format!(
                "Cannot install a challenge from state: {:?}",
                data.state
            )));
        }

        self.inner.nonce_count.store(0, Ordering::Release);
        data.challenge = Some(challenge);
        data.generation += 1;
        data.state = SessionState::Challenged;

        Ok(data.generation)
    }

    /// Sign a request with the current challenge
    ///
    /// Returns `None` if there is no usable challenge.
    pub fn sign(
        &self,
        credentials: &Credentials,
        method: &str,
        uri: &str,
        cnonce: &str,
    ) -> Option<Signature> {
        let data = self.inner.state.read();

        if !matches!(
            data.state,
            SessionState::Challenged | SessionState::Authenticated
        ) {
            return None;
        }
        let challenge = data.challenge.as_ref()?;

        // Counter is reset under the write lock, so it always belongs to this challenge
        let nc = self.inner.nonce_count.fetch_add(1, Ordering::AcqRel).wrapping_add(1);

        Some(Signature {
            authorization: challenge.authorize(credentials, method, uri, nc, cnonce),
            generation: data.generation,
        })
    }

    /// Mark the session authenticated after a signed request was accepted
    pub fn confirm(&self, generation: u64) -> bool {
        let mut data = self.inner.state.write();

        if data.generation != generation || data.state != SessionState::Challenged {
            return false;
        }

        data.state = SessionState::Authenticated;
        true
    }

    /// Drop the challenge after the device rejected the credentials
    ///
    /// No-op if the session has moved on to a newer generation.
    pub fn invalidate(&self, generation: u64) -> bool {
        self.retire(generation, SessionState::Unauthenticated)
    }

    /// Drop the challenge after the device reported the nonce as stale
    pub fn expire(&self, generation: u64) -> bool {
        self.retire(generation, SessionState::Expired)
    }

    /// Close session
    pub fn close(&self) {
        let mut data = self.inner.state.write();
        self.inner.nonce_count.store(0, Ordering::Release);
        data.challenge = None;
        data.state = SessionState::Unauthenticated;
    }

    fn retire(&self, generation: u64, next: SessionState) -> bool {
        let mut data = self.inner.state.write();

        if data.generation != generation || data.challenge.is_none() {
            return false;
        }

        data.challenge = None;
        data.state = next;
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
