/// AES-256-GCM for document payloads.
///
/// The 16-byte tag is appended to the ciphertext. Decryption either returns
/// the full authenticated plaintext or `DecryptionIntegrity`; the cipher
/// crate never exposes plaintext before the tag has been checked.
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::RngCore;

use crate::crypto::sensitive::DerivedKey;
use crate::error::{DrmError, Result};

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Generate a random 12-byte GCM nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

fn cipher(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt plaintext. Returns `ciphertext || tag`.
pub fn encrypt(key: &DerivedKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| DrmError::Encryption(e.to_string()))
}

/// Decrypt `ciphertext || tag`, verifying the tag.
pub fn decrypt(
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext_with_tag: &[u8],
) -> Result<Vec<u8>> {
    cipher(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext_with_tag)
        .map_err(|_| DrmError::DecryptionIntegrity)
}
