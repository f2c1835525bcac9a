//! Shared test fixtures: a cached key pair and a server-side envelope sealer

use std::sync::OnceLock;

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine};
use cbc::cipher::{block_padding::NoPadding, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

use crate::crypto::{SessionKeyPair, BLOCK_SIZE};
use crate::envelope::{EncryptedEnvelope, DATA_ENCRYPTION_ALGORITHM, KEY_ENCRYPTION_ALGORITHM};

/// One RSA key pair for the whole test binary
pub fn shared_keypair() -> &'static SessionKeyPair {
    static KEYPAIR: OnceLock<SessionKeyPair> = OnceLock::new();
    KEYPAIR.get_or_init(|| SessionKeyPair::generate().unwrap())
}

pub fn sample_person_json() -> String {
    serde_json::json!({
        "picture": "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk",
        "surname": "KOWALSKI",
        "names": "JAN MARIA",
        "pesel": "90010112345",
        "birthDate": "1990-01-01",
        "citizenship": "POLSKIE",
        "fatherName": "ADAM",
        "motherName": "EWA",
        "mobileIdCardNumber": "ZZC123456",
        "mobileIdCardValidFrom": "2020-01-01",
        "mobileIdCardValidTo": "2030-01-01"
    })
    .to_string()
}

/// Raw AES-CBC encryption, `plaintext` must be block aligned
pub fn encrypt_cbc(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
    assert_eq!(plaintext.len() % BLOCK_SIZE, 0, "plaintext not block aligned");

    match key.len() {
        16 => cbc::Encryptor::<aes::Aes128>::new_from_slices(key, iv)
            .unwrap()
            .encrypt_padded_vec_mut::<NoPadding>(plaintext),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .unwrap()
            .encrypt_padded_vec_mut::<NoPadding>(plaintext),
        other => panic!("unsupported test key length {}", other),
    }
}

/// Build an envelope the way the server does
///
/// The JSON is padded with whitespace to a block boundary; with
/// `trailing_marker` the last byte is the stray 0x01 the server emits.
pub fn seal(recipient: &RsaPublicKey, json: &[u8], trailing_marker: bool) -> EncryptedEnvelope {
    let mut rng = rand::rngs::OsRng;

    let mut aes_key = [0u8; 32];
    let mut iv = [0u8; BLOCK_SIZE];
    rng.fill_bytes(&mut aes_key);
    rng.fill_bytes(&mut iv);

    let suffix = usize::from(trailing_marker);
    let mut plaintext = json.to_vec();
    while (plaintext.len() + suffix) % BLOCK_SIZE != 0 {
        plaintext.push(b' ');
    }
    if trailing_marker {
        plaintext.push(0x01);
    }

    let ciphertext = encrypt_cbc(&aes_key, &iv, &plaintext);
    let wrapped = recipient
        .encrypt(&mut rng, Oaep::new::<Sha256>(), &aes_key)
        .unwrap();

    EncryptedEnvelope {
        encrypted_encryption_key: STANDARD.encode(wrapped),
        key_encryption_algorithm: KEY_ENCRYPTION_ALGORITHM.to_string(),
        encrypted_data: STANDARD.encode(ciphertext),
        data_encryption_iv: STANDARD.encode(iv),
        data_encryption_algorithm: DATA_ENCRYPTION_ALGORITHM.to_string(),
        verification_date: "2025-01-01T00:00:00Z".to_string(),
    }
}
