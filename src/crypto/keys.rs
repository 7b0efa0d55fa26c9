/// Ephemeral RSA-OAEP key pairs for license exchange.
///
/// A key pair is created per document-open session and dropped with it.
/// The public half is exported as SPKI DER for the license request; the
/// private half never leaves this process and is zeroized on drop.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{DrmError, Result};

pub const RSA_MODULUS_BITS: usize = 2048;
pub const RSA_MIN_MODULUS_BITS: usize = 2048;

/// OAEP padding used for wrapping and unwrapping. SHA-256 for both the
/// label digest and MGF1; this is fixed by the license protocol.
pub fn oaep_padding() -> Oaep {
    Oaep::new::<Sha256>()
}

pub struct KeyPair {
    public_key_der: Vec<u8>,
    private_key: RsaPrivateKey,
}

impl KeyPair {
    /// Generate a 2048-bit key pair.
    pub fn generate() -> Result<Self> {
        Self::generate_with_bits(RSA_MODULUS_BITS)
    }

    pub fn generate_with_bits(bits: usize) -> Result<Self> {
        if bits < RSA_MIN_MODULUS_BITS {
            return Err(DrmError::KeyGeneration(format!(
                "modulus of {bits} bits is below the {RSA_MIN_MODULUS_BITS}-bit minimum"
            )));
        }
        let private_key = RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)
            .map_err(|e| DrmError::KeyGeneration(e.to_string()))?;
        Self::from_private_key(private_key)
    }

    /// Import a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| DrmError::KeyGeneration(format!("invalid PKCS#8 key: {e}")))?;
        Self::from_private_key(private_key)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Result<Self> {
        let public_key_der = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .map_err(|e| DrmError::KeyGeneration(format!("SPKI export failed: {e}")))?
            .as_bytes()
            .to_vec();

        Ok(Self {
            public_key_der,
            private_key,
        })
    }

    /// SPKI DER encoding of the public key.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// SPKI DER, base64-encoded for the license request body.
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(&self.public_key_der)
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Modulus size in bytes; the length of every wrapped key.
    pub fn modulus_len(&self) -> usize {
        self.private_key.size()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("modulus_bits", &(self.modulus_len() * 8))
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Wrap a content-key secret against an SPKI public key.
///
/// This is the issuing-side half of the exchange; the pipeline itself only
/// unwraps.
pub fn wrap_content_key(public_key_der: &[u8], secret: &[u8]) -> Result<Vec<u8>> {
    let public_key = RsaPublicKey::from_public_key_der(public_key_der)
        .map_err(|e| DrmError::Encryption(format!("invalid SPKI public key: {e}")))?;

    public_key
        .encrypt(&mut rand::rngs::OsRng, oaep_padding(), secret)
        .map_err(|e| DrmError::Encryption(e.to_string()))
}
