//! Verification session state machine
//!
//! ```text
//! Created --begin()--> Started --poll() Ready--> Completed
//!                         |                         |
//!                         +--- deadline passed ---> Expired
//! ```
//! `begin()` is accepted only once. Key material lives in the state and is
//! dropped (and zeroized) when the session expires or goes out of scope.

use std::fmt;

use secrecy::SecretString;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PollPolicy;
use crate::crypto::{EncodedPublicKey, SessionKeyPair};
use crate::error::{VerifierError, VerifierResult};
use crate::models::{AppPrompt, PersonRecord};
use crate::transport::{PullOutcome, SessionTransport};

/// Observable session lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Created,
    Started,
    Completed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single `poll()`
#[derive(Debug)]
pub enum PollOutcome {
    Verified(PersonRecord),
    /// Nothing yet - wait and poll again
    Pending,
}

/// Result of `wait_for_person()`
#[derive(Debug)]
pub enum WaitOutcome {
    Verified(PersonRecord),
    /// Deadline passed without data
    Expired,
    /// The cancellation token fired while waiting
    Cancelled,
}

/// Everything a started session needs to pull and decrypt data
struct Credentials {
    keypair: SessionKeyPair,
    public_key: EncodedPublicKey,
    secret: SecretString,
}

enum SessionState {
    Created,
    Started(Credentials),
    Completed(Credentials),
    Expired,
}

/// One remote identity verification
pub struct VerificationSession<T: SessionTransport> {
    id: Uuid,
    transport: T,
    state: SessionState,
}

impl<T: SessionTransport> VerificationSession<T> {
    /// New session with a random UUID
    pub fn new(transport: T) -> Self {
        Self::with_id(Uuid::new_v4(), transport)
    }

    pub fn with_id(id: Uuid, transport: T) -> Self {
        Self {
            id,
            transport,
            state: SessionState::Created,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Created => SessionStatus::Created,
            SessionState::Started(_) => SessionStatus::Started,
            SessionState::Completed(_) => SessionStatus::Completed,
            SessionState::Expired => SessionStatus::Expired,
        }
    }

    /// Public key registered with the server, once started
    pub fn public_key(&self) -> Option<&EncodedPublicKey> {
        self.credentials().map(|c| &c.public_key)
    }

    /// Generate the key pair, register the session and return the app prompt
    pub async fn begin(&mut self) -> VerifierResult<AppPrompt> {
        if !matches!(self.state, SessionState::Created) {
            return Err(VerifierError::SessionReused);
        }

        let keypair = tokio::task::spawn_blocking(SessionKeyPair::generate)
            .await
            .map_err(|e| VerifierError::KeyGeneration(e.to_string()))??;
        let public_key = keypair.export_public_key()?;

        let response = self.transport.start_session(&self.id, &public_key).await?;
        let prompt = response.prompt();

        info!(
            session_id = %self.id,
            key = %public_key.fingerprint(),
            "Verification session started"
        );

        self.state = SessionState::Started(Credentials {
            keypair,
            public_key,
            secret: response.secret,
        });

        Ok(prompt)
    }

    /// Pull the person data once
    pub async fn poll(&mut self) -> VerifierResult<PollOutcome> {
        let credentials = match &self.state {
            SessionState::Created => return Err(VerifierError::SessionNotStarted),
            SessionState::Expired => return Err(VerifierError::SessionExpired),
            SessionState::Started(c) | SessionState::Completed(c) => c,
        };

        let outcome = self
            .transport
            .pull_data(&self.id, &credentials.secret, &credentials.public_key)
            .await?;

        match outcome {
            PullOutcome::NotReady => Ok(PollOutcome::Pending),
            PullOutcome::Ready(envelope) => {
                let person = envelope.decrypt(&credentials.keypair)?;
                self.complete();
                info!(session_id = %self.id, "Identity verified");
                Ok(PollOutcome::Verified(person))
            }
        }
    }

    /// Poll at a fixed interval until data arrives, the deadline passes or
    /// `cancel` fires
    ///
    /// Each attempt waits one interval first, then polls. Errors from a poll
    /// end the wait immediately. `cancel` also aborts an in-flight request.
    /// A started session becomes expired when the deadline passes; a
    /// completed one stays completed.
    pub async fn wait_for_person(
        &mut self,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> VerifierResult<WaitOutcome> {
        policy.validate()?;
        match self.state {
            SessionState::Created => return Err(VerifierError::SessionNotStarted),
            SessionState::Expired => return Err(VerifierError::SessionExpired),
            SessionState::Started(_) | SessionState::Completed(_) => {}
        }

        let session_id = self.id;
        let deadline = Instant::now() + policy.max_wait();
        let mut attempt = 0u64;

        loop {
            let next = Instant::now() + policy.interval();
            if next > deadline {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(%session_id, attempt, "Waiting cancelled");
                    return Ok(WaitOutcome::Cancelled);
                }
                _ = sleep_until(next) => {}
            }

            attempt += 1;
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(%session_id, attempt, "Waiting cancelled during request");
                    return Ok(WaitOutcome::Cancelled);
                }
                outcome = self.poll() => outcome?,
            };

            match outcome {
                PollOutcome::Verified(person) => return Ok(WaitOutcome::Verified(person)),
                PollOutcome::Pending => {
                    debug!(%session_id, attempt, "No data yet");
                }
            }
        }

        warn!(%session_id, attempt, "No data before deadline");
        if matches!(self.state, SessionState::Started(_)) {
            self.expire();
        }
        Ok(WaitOutcome::Expired)
    }

    /// Mark the session expired and drop its key material
    pub fn expire(&mut self) {
        self.state = SessionState::Expired;
    }

    fn complete(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Expired);
        self.state = match state {
            SessionState::Started(c) | SessionState::Completed(c) => SessionState::Completed(c),
            other => other,
        };
    }

    fn credentials(&self) -> Option<&Credentials> {
        match &self.state {
            SessionState::Started(c) | SessionState::Completed(c) => Some(c),
            SessionState::Created | SessionState::Expired => None,
        }
    }
}

impl<T: SessionTransport> fmt::Debug for VerificationSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationSession")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
