/// Cryptographic building blocks for the content pipeline.
///
/// - `keys`: ephemeral RSA-2048 OAEP key pairs (SPKI export, wrap)
/// - `unwrap`: OAEP-SHA-256 recovery of the content-key secret
/// - `kdf`: PBKDF2-HMAC-SHA256 per-envelope key derivation
/// - `aead`: AES-256-GCM
/// - `envelope`: salt | nonce | ciphertext | tag layout
/// - `content`: envelope decryption and sealing
/// - `sensitive`: zeroize-on-drop key containers
pub mod aead;
pub mod content;
pub mod envelope;
pub mod kdf;
pub mod keys;
pub mod sensitive;
pub mod unwrap;
