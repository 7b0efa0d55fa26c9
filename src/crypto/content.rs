/// Document payload decryption (and its issuing-side inverse).
///
/// 1. Parse the envelope into salt, nonce and ciphertext
/// 2. Derive a fresh AEAD key from the content key and the salt (PBKDF2)
/// 3. AES-256-GCM decrypt with mandatory tag verification
///
/// The derived key is dropped (and zeroized) before this returns.
use tracing::debug;

use crate::crypto::envelope::EncryptedEnvelope;
use crate::crypto::sensitive::ContentKey;
use crate::crypto::{aead, kdf};
use crate::error::Result;

/// Decrypt an envelope with the session's content key.
///
/// Fails with `EnvelopeMalformed` for short buffers and with
/// `DecryptionIntegrity` for any tag mismatch. Never returns partial output.
pub fn decrypt(envelope_bytes: &[u8], content_key: &ContentKey) -> Result<Vec<u8>> {
    let envelope = EncryptedEnvelope::parse(envelope_bytes)?;
    let key = kdf::derive_key(content_key, &envelope.salt);
    let plaintext = aead::decrypt(&key, &envelope.nonce, envelope.ciphertext)?;

    debug!(
        envelope_len = envelope_bytes.len(),
        plaintext_len = plaintext.len(),
        "Envelope decrypted"
    );

    Ok(plaintext)
}

/// Build an envelope for `plaintext` under a fresh random salt and nonce.
///
/// Used by the issuing side and by fixtures; every call yields a distinct
/// derived key so nonce reuse across issuances cannot happen.
pub fn seal(plaintext: &[u8], content_key: &ContentKey) -> Result<Vec<u8>> {
    let salt = kdf::generate_salt();
    let nonce = aead::generate_nonce();
    let key = kdf::derive_key(content_key, &salt);
    let ciphertext = aead::encrypt(&key, &nonce, plaintext)?;

    Ok(EncryptedEnvelope {
        salt,
        nonce,
        ciphertext: &ciphertext,
    }
    .to_bytes())
}
