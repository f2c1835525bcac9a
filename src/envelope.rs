//! Encrypted person envelope
//!
//! Hybrid scheme used by the data-pull endpoint:
//! ```text
//! encryptedEncryptionKey  = RSA-OAEP(SHA-256, MGF1-SHA-256)(session public key, AES key)
//! encryptedData           = AES-CBC(AES key, dataEncryptionIv, person JSON)
//! ```
//! There is no authentication tag on the payload. Integrity is left to TLS.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{decrypt_cbc, SessionKeyPair};
use crate::error::{VerifierError, VerifierResult};
use crate::models::{PersonPayload, PersonRecord};

/// Key wrapping algorithm announced by the server
pub const KEY_ENCRYPTION_ALGORITHM: &str = "RSA/ECB/OAEPwithSHA-256andMGF1Padding";

/// Payload algorithm announced by the server
pub const DATA_ENCRYPTION_ALGORITHM: &str = "AES/CBC/PKCS5Padding";

/// Stray byte the server leaves at the end of the person JSON
const TRAILING_GARBAGE: u8 = 0x01;

/// Encrypted person data as returned by the data-pull endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    /// Base64 AES key, wrapped with the session public key
    pub encrypted_encryption_key: String,
    pub key_encryption_algorithm: String,
    /// Base64 AES-CBC ciphertext of the person JSON
    pub encrypted_data: String,
    /// Base64 IV
    pub data_encryption_iv: String,
    pub data_encryption_algorithm: String,
    /// Plain text, e.g. "2025-01-01T00:00:00Z"
    pub verification_date: String,
}

impl EncryptedEnvelope {
    /// Decrypt the envelope with the session key pair
    pub fn decrypt(self, keypair: &SessionKeyPair) -> VerifierResult<PersonRecord> {
        self.check_algorithms()?;

        let aes_key = self.unwrap_key(keypair)?;
        let plaintext = self.decrypt_payload(&aes_key)?;

        let json = strip_trailing_garbage(&plaintext);
        let text = std::str::from_utf8(json)
            .map_err(|e| VerifierError::PayloadCorrupted(format!("not UTF-8: {}", e)))?;

        let payload: PersonPayload =
            serde_json::from_str(text).map_err(|e| VerifierError::PayloadParse(e.to_string()))?;

        debug!(verification_date = %self.verification_date, "Person data decrypted");
        Ok(PersonRecord::from_payload(self.verification_date, payload))
    }

    fn check_algorithms(&self) -> VerifierResult<()> {
        if !self
            .key_encryption_algorithm
            .eq_ignore_ascii_case(KEY_ENCRYPTION_ALGORITHM)
        {
            return Err(VerifierError::UnsupportedAlgorithm {
                field: "key encryption algorithm",
                value: self.key_encryption_algorithm.clone(),
            });
        }

        if !self
            .data_encryption_algorithm
            .eq_ignore_ascii_case(DATA_ENCRYPTION_ALGORITHM)
        {
            return Err(VerifierError::UnsupportedAlgorithm {
                field: "data encryption algorithm",
                value: self.data_encryption_algorithm.clone(),
            });
        }

        Ok(())
    }

    fn unwrap_key(&self, keypair: &SessionKeyPair) -> VerifierResult<Zeroizing<Vec<u8>>> {
        let wrapped = STANDARD.decode(&self.encrypted_encryption_key)?;
        keypair.unwrap_key(&wrapped)
    }

    fn decrypt_payload(&self, aes_key: &[u8]) -> VerifierResult<Zeroizing<Vec<u8>>> {
        let ciphertext = STANDARD.decode(&self.encrypted_data)?;
        let iv = STANDARD.decode(&self.data_encryption_iv)?;

        decrypt_cbc(aes_key, &iv, &ciphertext)
    }
}

fn strip_trailing_garbage(plaintext: &[u8]) -> &[u8] {
    let end = plaintext
        .iter()
        .rposition(|&b| b != TRAILING_GARBAGE)
        .map_or(0, |pos| pos + 1);
    &plaintext[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_person_json, seal, shared_keypair};

    #[test]
    fn test_decrypt_with_trailing_marker() {
        let envelope = seal(
            shared_keypair().public_key(),
            sample_person_json().as_bytes(),
            true,
        );

        let person = envelope.decrypt(shared_keypair()).unwrap();
        assert_eq!(person.surname, "KOWALSKI");
        assert_eq!(person.given_names, "JAN MARIA");
        assert_eq!(person.birth_date, "1990-01-01");
        assert_eq!(person.verification_timestamp, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_decrypt_without_trailing_marker() {
        let envelope = seal(
            shared_keypair().public_key(),
            sample_person_json().as_bytes(),
            false,
        );

        let person = envelope.decrypt(shared_keypair()).unwrap();
        assert_eq!(person.national_id, "90010112345");
        assert_eq!(person.document_expiry_date, "2030-01-01");
    }

    #[test]
    fn test_wrong_key_fails() {
        let other = SessionKeyPair::generate().unwrap();
        let envelope = seal(other.public_key(), sample_person_json().as_bytes(), true);

        let result = envelope.decrypt(shared_keypair());
        assert!(matches!(result, Err(VerifierError::DecryptionFailed(_))));
    }

    #[test]
    fn test_incomplete_person_rejected() {
        let envelope = seal(
            shared_keypair().public_key(),
            br#"{"surname":"KOWALSKI","names":"JAN"}"#,
            true,
        );

        let result = envelope.decrypt(shared_keypair());
        assert!(matches!(result, Err(VerifierError::PayloadParse(_))));
    }

    #[test]
    fn test_non_utf8_payload_is_corrupted() {
        let mut json = sample_person_json().into_bytes();
        json.insert(1, 0xFF);

        let envelope = seal(shared_keypair().public_key(), &json, true);

        let result = envelope.decrypt(shared_keypair());
        assert!(matches!(result, Err(VerifierError::PayloadCorrupted(_))));
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let mut envelope = seal(
            shared_keypair().public_key(),
            sample_person_json().as_bytes(),
            true,
        );
        envelope.data_encryption_algorithm = "AES/GCM/NoPadding".into();

        let result = envelope.decrypt(shared_keypair());
        assert!(matches!(
            result,
            Err(VerifierError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn test_bad_base64_rejected() {
        let mut envelope = seal(
            shared_keypair().public_key(),
            sample_person_json().as_bytes(),
            true,
        );
        envelope.encrypted_encryption_key = "not base64!".into();

        assert!(matches!(
            envelope.decrypt(shared_keypair()),
            Err(VerifierError::Base64(_))
        ));
    }

    #[test]
    fn test_envelope_wire_names() {
        let json = r#"{
            "encryptedEncryptionKey": "a",
            "keyEncryptionAlgorithm": "RSA/ECB/OAEPwithSHA-256andMGF1Padding",
            "encryptedData": "b",
            "dataEncryptionIv": "c",
            "dataEncryptionAlgorithm": "AES/CBC/PKCS5Padding",
            "verificationDate": "2025-01-01T00:00:00Z"
        }"#;

        let envelope: EncryptedEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.encrypted_data, "b");
        assert_eq!(envelope.verification_date, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_strip_trailing_garbage() {
        assert_eq!(strip_trailing_garbage(b"{}\x01"), b"{}");
        assert_eq!(strip_trailing_garbage(b"{}"), b"{}");
        assert_eq!(strip_trailing_garbage(b"\x01\x01"), b"");
    }
}
