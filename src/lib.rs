//! # mobywrapper
//!
//! Client for the mObywatel remote identity verification flow
//! (https://weryfikator.mobywatel.gov.pl/).
//!
//! ## Flow
//!
//! ```text
//! VerificationSession::begin()
//!   ├─ generate RSA-2048 key pair
//!   ├─ POST /verifications {sessionUuid, publicKey}   -> {code, qrCode, secret}
//!   └─ AppPrompt (code shown to the person)
//!
//! VerificationSession::poll() / wait_for_person()
//!   ├─ POST /verifications/{id}/data/encrypt-and-get
//!   │    204 -> Pending
//!   │    200 -> EncryptedEnvelope
//!   └─ RSA-OAEP unwrap AES key -> AES-CBC decrypt -> PersonRecord
//! ```
//!
//! ## Security Model
//!
//! - Fresh key pair per session, kept in memory only
//! - Session secret held in `secrecy::SecretString`
//! - Symmetric key and plaintext buffers zeroized after use
//! - The payload is confidentiality-only (no MAC); integrity relies on TLS

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::{PollPolicy, TransportConfig, VerifierConfig};
pub use crypto::{EncodedPublicKey, SessionKeyPair};
pub use envelope::EncryptedEnvelope;
pub use error::{VerifierError, VerifierResult};
pub use models::{AppPrompt, PersonRecord};
pub use session::{PollOutcome, SessionStatus, VerificationSession, WaitOutcome};
pub use transport::{HttpTransport, PullOutcome, SessionTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create a session against the official server with default settings
pub fn default_session() -> VerifierResult<VerificationSession<HttpTransport>> {
    let transport = HttpTransport::new(TransportConfig::default())?;
    Ok(VerificationSession::new(transport))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.2.0");
    }

    #[test]
    fn test_default_session_starts_created() {
        let session = default_session().unwrap();
        assert_eq!(session.status(), SessionStatus::Created);
        assert!(session.public_key().is_none());
    }
}
