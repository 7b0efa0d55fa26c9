/// PBKDF2-HMAC-SHA256 derivation of the per-envelope AEAD key.
///
/// The content-key secret is the password input and the envelope salt the
/// salt. Iteration count and hash are protocol constants shared with the
/// issuing side; changing either makes every existing envelope unreadable.
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::crypto::sensitive::{ContentKey, DerivedKey, DERIVED_KEY_LEN};

pub const PBKDF2_ITERATIONS: u32 = 10_000;
pub const SALT_LEN: usize = 16;

/// Generate a random 16-byte envelope salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the 256-bit AEAD key for one envelope.
///
/// The secret is consumed as raw bytes; it is never decoded as text first.
pub fn derive_key(content_key: &ContentKey, salt: &[u8; SALT_LEN]) -> DerivedKey {
    let mut output = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(content_key.as_bytes(), salt, PBKDF2_ITERATIONS, &mut output);
    DerivedKey::new(output)
}
