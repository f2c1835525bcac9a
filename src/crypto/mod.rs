//! Crypto module - RSA-OAEP key unwrap, AES-CBC payload decryption

mod cbc;
mod keys;

pub use self::cbc::{decrypt_cbc, BLOCK_SIZE};
pub use keys::{
    EncodedPublicKey, SessionKeyPair, PUBLIC_KEY_ALGORITHM, RSA_KEY_BITS, RSA_PUBLIC_EXPONENT,
};
