/// Recovery of the content-key secret from a license.
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;

use crate::crypto::keys::oaep_padding;
use crate::crypto::sensitive::ContentKey;
use crate::error::{DrmError, Result};

/// OAEP-decrypt a wrapped content key with the session's private key.
///
/// A wrong key, a hash mismatch and a corrupted license all look the same
/// here and all fail closed with `KeyUnwrap`. Callers must not retry with
/// the same inputs.
pub fn unwrap_content_key(wrapped: &[u8], private_key: &RsaPrivateKey) -> Result<ContentKey> {
    let modulus_len = private_key.size();
    if wrapped.len() != modulus_len {
        return Err(DrmError::KeyUnwrap(format!(
            "wrapped key is {} bytes, expected {modulus_len}",
            wrapped.len()
        )));
    }

    let secret = private_key
        .decrypt_blinded(&mut rand::rngs::OsRng, oaep_padding(), wrapped)
        .map_err(|e| DrmError::KeyUnwrap(e.to_string()))?;

    if secret.is_empty() {
        return Err(DrmError::KeyUnwrap("license carried an empty secret".into()));
    }

    Ok(ContentKey::new(secret))
}
