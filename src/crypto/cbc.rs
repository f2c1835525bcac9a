//! AES-CBC payload decryption
//!
//! The payload layer is confidentiality-only: no MAC, and padding is not
//! validated here. Trailing bytes are the caller's concern.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use zeroize::Zeroizing;

use crate::error::{VerifierError, VerifierResult};

/// AES block / IV size
pub const BLOCK_SIZE: usize = 16;

/// Decrypt `ciphertext` with AES-CBC, picking AES-128/192/256 by key length
pub fn decrypt_cbc(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> VerifierResult<Zeroizing<Vec<u8>>> {
    if iv.len() != BLOCK_SIZE {
        return Err(VerifierError::DecryptionFailed(format!(
            "invalid IV length: expected {}, got {}",
            BLOCK_SIZE,
            iv.len()
        )));
    }

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    let len = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(init_failed)?
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map(|plaintext| plaintext.len()),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(init_failed)?
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map(|plaintext| plaintext.len()),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(init_failed)?
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map(|plaintext| plaintext.len()),
        actual => {
            return Err(VerifierError::InvalidKeyLength {
                expected: "16, 24 or 32",
                actual,
            })
        }
    }
    .map_err(|_| {
        VerifierError::DecryptionFailed(format!(
            "ciphertext length {} is not a multiple of {}",
            ciphertext.len(),
            BLOCK_SIZE
        ))
    })?;

    buffer.truncate(len);
    Ok(buffer)
}

fn init_failed(e: cbc::cipher::InvalidLength) -> VerifierError {
    VerifierError::DecryptionFailed(format!("AES-CBC init failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::encrypt_cbc;

    #[test]
    fn test_aes256_roundtrip() {
        let key = [3u8; 32];
        let iv = [9u8; 16];
        let plaintext = b"exactly thirty-two bytes long!!!";

        let ciphertext = encrypt_cbc(&key, &iv, plaintext);
        let decrypted = decrypt_cbc(&key, &iv, &ciphertext).unwrap();
        assert_eq!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn test_aes128_roundtrip() {
        let key = [3u8; 16];
        let iv = [1u8; 16];
        let plaintext = b"sixteen bytes!!!";

        let ciphertext = encrypt_cbc(&key, &iv, plaintext);
        let decrypted = decrypt_cbc(&key, &iv, &ciphertext).unwrap();
        assert_eq!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn test_rejects_bad_key_length() {
        let result = decrypt_cbc(&[0u8; 20], &[0u8; 16], &[0u8; 16]);
        assert!(matches!(
            result,
            Err(VerifierError::InvalidKeyLength { actual: 20, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_iv_and_partial_block() {
        assert!(decrypt_cbc(&[0u8; 32], &[0u8; 8], &[0u8; 16]).is_err());
        assert!(decrypt_cbc(&[0u8; 32], &[0u8; 16], &[0u8; 17]).is_err());
    }
}
