//! mobywrapper - Error Types

use thiserror::Error;

/// Result type for verification operations
pub type VerifierResult<T> = Result<T, VerifierError>;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerifierError {
    // ═══════════════════════════════════════════════════════════════
    // TRANSPORT ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Unexpected response from verification server: HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    // ═══════════════════════════════════════════════════════════════
    // SESSION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Cannot re-use the same verification session")]
    SessionReused,

    #[error("Verification session has not been started - call begin() first")]
    SessionNotStarted,

    #[error("Verification session expired")]
    SessionExpired,

    // ═══════════════════════════════════════════════════════════════
    // CRYPTO ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: &'static str, actual: usize },

    #[error("Unsupported {field}: {value}")]
    UnsupportedAlgorithm { field: &'static str, value: String },

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    // ═══════════════════════════════════════════════════════════════
    // PAYLOAD ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Decrypted payload corrupted: {0}")]
    PayloadCorrupted(String),

    #[error("Decrypted payload does not describe a person: {0}")]
    PayloadParse(String),

    // ═══════════════════════════════════════════════════════════════
    // CONFIG ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifierError {
    /// Check if this error points at a key or protocol mismatch
    pub fn is_security_critical(&self) -> bool {
        matches!(
            self,
            VerifierError::DecryptionFailed(_)
                | VerifierError::InvalidKeyLength { .. }
                | VerifierError::UnsupportedAlgorithm { .. }
        )
    }

    /// Check if repeating the same call may succeed
    pub fn is_retriable(&self) -> bool {
        match self {
            VerifierError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// HTTP status carried by a transport error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            VerifierError::UnexpectedStatus { status } => Some(*status),
            _ => None,
        }
    }
}
