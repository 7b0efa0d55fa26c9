/// Binary layout of an encrypted document payload.
///
/// Format:
/// [salt(16B) | nonce(12B) | ciphertext | tag(16B)]
///
/// There is no version byte or length prefix; everything after the nonce is
/// handed to the AEAD as-is.
use crate::crypto::aead::{NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::SALT_LEN;
use crate::error::{DrmError, Result};

pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + TAG_LEN;

/// A parsed envelope borrowing its ciphertext from the fetched body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope<'a> {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the GCM tag still appended.
    pub ciphertext: &'a [u8],
}

impl<'a> EncryptedEnvelope<'a> {
    /// Split a buffer into its fields. Buffers too short to hold a header
    /// and a tag are rejected before any slicing happens.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < MIN_ENVELOPE_LEN {
            return Err(DrmError::EnvelopeMalformed(format!(
                "envelope too short: {} bytes (minimum {})",
                data.len(),
                MIN_ENVELOPE_LEN
            )));
        }

        let (salt_bytes, rest) = data.split_at(SALT_LEN);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(salt_bytes);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(self.ciphertext);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offsets() {
        let mut data = vec![0x11; SALT_LEN];
        data.extend_from_slice(&[0x22; NONCE_LEN]);
        data.extend_from_slice(&[0x33; 40]);

        let envelope = EncryptedEnvelope::parse(&data).unwrap();
        assert_eq!(envelope.salt, [0x11; SALT_LEN]);
        assert_eq!(envelope.nonce, [0x22; NONCE_LEN]);
        assert_eq!(envelope.ciphertext, &[0x33; 40][..]);
        assert_eq!(envelope.to_bytes(), data);
    }

    #[test]
    fn test_every_short_length_rejected() {
        let data = vec![0u8; MIN_ENVELOPE_LEN];
        for len in 0..MIN_ENVELOPE_LEN {
            let result = EncryptedEnvelope::parse(&data[..len]);
            assert!(
                matches!(result, Err(DrmError::EnvelopeMalformed(_))),
                "length {len} should be malformed"
            );
        }
    }

    #[test]
    fn test_minimum_length_accepted() {
        let data = vec![0u8; MIN_ENVELOPE_LEN];
        let envelope = EncryptedEnvelope::parse(&data).unwrap();
        assert_eq!(envelope.ciphertext.len(), TAG_LEN);
    }
}
