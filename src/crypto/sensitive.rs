/// Containers for secret material that is wiped from memory on drop.
///
/// Neither type implements `Clone` or `Serialize`: a content key lives for
/// one decrypt operation and is never copied out or persisted.
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const DERIVED_KEY_LEN: usize = 32;

/// The content-key secret recovered from a license.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ContentKey(Vec<u8>);

impl ContentKey {
    pub fn new(secret: Vec<u8>) -> Self {
        Self(secret)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentKey([REDACTED; {}])", self.0.len())
    }
}

/// A 256-bit AEAD key derived from a [`ContentKey`]. Only ever used to open
/// an envelope.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_LEN]);

impl DerivedKey {
    pub fn new(bytes: [u8; DERIVED_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}
