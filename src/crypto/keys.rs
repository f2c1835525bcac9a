//! mobywrapper - Session Key Pair
//!
//! One RSA-2048 key pair per verification session. The public half travels
//! to the server as base64 DER SubjectPublicKeyInfo; the private half never
//! leaves the process and unwraps the AES key of the returned envelope.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::{pkcs8::EncodePublicKey, BigUint, Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{VerifierError, VerifierResult};

/// RSA modulus size in bits
pub const RSA_KEY_BITS: usize = 2048;

/// RSA public exponent
pub const RSA_PUBLIC_EXPONENT: u32 = 65_537;

/// Algorithm name announced next to the encoded public key
pub const PUBLIC_KEY_ALGORITHM: &str = "RSA";

/// Public key in base64-encoded DER (SubjectPublicKeyInfo) form
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedPublicKey(String);

impl EncodedPublicKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short SHA-256 fingerprint, safe to log
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for EncodedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncodedPublicKey")
            .field(&self.fingerprint())
            .finish()
    }
}

impl fmt::Display for EncodedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// RSA key pair owned by a single verification session
///
/// `RsaPrivateKey` zeroizes its components on drop.
pub struct SessionKeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl SessionKeyPair {
    /// Generate a fresh RSA-2048 key pair with e = 65537
    pub fn generate() -> VerifierResult<Self> {
        let mut rng = rand::rngs::OsRng;
        let exponent = BigUint::from(RSA_PUBLIC_EXPONENT);

        let private_key = RsaPrivateKey::new_with_exp(&mut rng, RSA_KEY_BITS, &exponent)
            .map_err(|e| VerifierError::KeyGeneration(e.to_string()))?;

        Ok(Self::from_private_key(private_key))
    }

    /// Wrap an existing private key
    pub fn from_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Export the public key as base64 DER SubjectPublicKeyInfo
    pub fn export_public_key(&self) -> VerifierResult<EncodedPublicKey> {
        let der = self
            .public_key
            .to_public_key_der()
            .map_err(|e| VerifierError::KeyGeneration(format!("SPKI encoding failed: {}", e)))?;

        Ok(EncodedPublicKey(STANDARD.encode(der.as_bytes())))
    }

    /// Unwrap a symmetric key with RSA-OAEP (MGF1 + SHA-256)
    pub fn unwrap_key(&self, wrapped: &[u8]) -> VerifierResult<Zeroizing<Vec<u8>>> {
        self.private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map(Zeroizing::new)
            .map_err(|e| VerifierError::DecryptionFailed(format!("RSA-OAEP unwrap failed: {}", e)))
    }
}

impl fmt::Debug for SessionKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeyPair")
            .field("bits", &RSA_KEY_BITS)
            .finish_non_exhaustive()
    }
}
