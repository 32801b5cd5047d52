//! Digest-authenticated request exchange
//!
//! Owns the gateway's single [`Session`]. A request is signed with the
//! current challenge when there is one; otherwise a challenge round is run
//! first. Challenge rounds are serialized: callers that queue behind an
//! in-flight round re-check the session and reuse what it produced.
//!
//! Transient network failures are retried here, above signing, so every
//! attempt goes out with its own nonce count.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use dahua_core::auth::generate_cnonce;
use dahua_core::{Credentials, DigestChallenge, EncodedRequest, Session, SessionState, Signature};
use dahua_transport::{Response, RetryPolicy, Transport};

use crate::error::{Error, Result};

/// Result of one signed exchange
#[derive(Debug)]
pub enum Exchange {
    /// Device answered with something other than `401`
    Reply(Response),

    /// Device refused the signature; the session has already been retired
    Rejected,
}

#[derive(Debug)]
pub struct Authenticator {
    credentials: Credentials,
    session: Session,
    renewal: Mutex<()>,
    rounds: AtomicU64,
    retry: RetryPolicy,
}

impl Authenticator {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            session: Session::new(),
            renewal: Mutex::new(()),
            rounds: AtomicU64::new(0),
            retry: RetryPolicy::default(),
        }
    }

    /// Set retry policy for transient network failures
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Number of completed challenge rounds
    pub fn challenge_rounds(&self) -> u64 {
        self.rounds.load(Ordering::Acquire)
    }

    /// Send a request with digest authorization
    ///
    /// # Errors
    ///
    /// Transport failures are returned once retries are exhausted. A probe
    /// that does not yield a usable challenge is [`Error::ChallengeMissing`]
    /// or a core challenge error.
    pub async fn send(&self, transport: &dyn Transport, request: &EncodedRequest) -> Result<Exchange> {
        // Sign what the transport will put on the request line
        let uri = transport.request_uri(request)?;
        let uri = uri.as_str();

        self.retry
            .run(move |attempt| {
                if attempt > 0 {
                    debug!("Attempt {} for {}", attempt + 1, request.command);
                }
                self.send_once(transport, request, uri)
            })
            .await
    }

    async fn send_once(
        &self,
        transport: &dyn Transport,
        request: &EncodedRequest,
        uri: &str,
    ) -> Result<Exchange> {
        let signature = match self.sign(request, uri) {
            Some(signature) => signature,
            None => {
                self.renew(transport).await?;
                match self.sign(request, uri) {
                    Some(signature) => signature,
                    // Retired by a concurrent rejection before we could sign
                    None => return Ok(Exchange::Rejected),
                }
            }
        };

        let response = transport
            .send(request, Some(&signature.authorization))
            .await?;

        if !response.is_unauthorized() {
            if self.session.confirm(signature.generation) {
                info!("Authenticated as '{}'", self.username());
            }
            return Ok(Exchange::Reply(response));
        }

        let stale = DigestChallenge::from_headers(response.www_authenticate.iter().map(String::as_str))
            .map(|challenge| challenge.stale)
            .unwrap_or(false);

        if stale {
            debug!("Nonce expired (generation {})", signature.generation);
            self.session.expire(signature.generation);
        } else {
            warn!(
                "Device rejected credentials for '{}' (generation {})",
                self.username(),
                signature.generation
            );
            self.session.invalidate(signature.generation);
        }

        Ok(Exchange::Rejected)
    }

    fn sign(&self, request: &EncodedRequest, uri: &str) -> Option<Signature> {
        self.session
            .sign(&self.credentials, request.method(), uri, &generate_cnonce())
    }

    /// Run a challenge round unless another caller already did
    async fn renew(&self, transport: &dyn Transport) -> Result<()> {
        let _guard = self.renewal.lock().await;

        if !self.session.needs_renewal() {
            debug!("Reusing session renewed by a concurrent request");
            return Ok(());
        }

        info!("Requesting digest challenge from {}", transport.remote_addr());

        let response = transport.send(&EncodedRequest::probe(), None).await?;
        if !response.is_unauthorized() {
            return Err(Error::ChallengeMissing(response.status));
        }

        // Only touch the session once the round is complete
        let challenge = DigestChallenge::from_headers(response.www_authenticate.iter().map(String::as_str))?;
        debug!(
            "Challenge: realm='{}', algorithm={}, qop={}",
            challenge.realm,
            challenge.algorithm,
            if challenge.qop_auth { "auth" } else { "none" }
        );

        let generation = self.session.challenge(challenge)?;
        self.rounds.fetch_add(1, Ordering::AcqRel);
        debug!("Session challenged (generation {})", generation);

        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }
}
