use serde::Serialize;
use thiserror::Error;

/// Generic text shown to the user for every pipeline failure.
pub const USER_MESSAGE: &str = "This content cannot be opened securely.";

/// Why the license service refused to issue a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    Unauthorized,
    Forbidden,
    NotFound,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DenialReason::Unauthorized => "unauthorized",
            DenialReason::Forbidden => "forbidden",
            DenialReason::NotFound => "not found",
        };
        f.write_str(s)
    }
}

/// Network stage a timeout was hit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    License,
    Content,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::License => f.write_str("license request"),
            Stage::Content => f.write_str("content fetch"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DrmError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("License denied: {0}")]
    LicenseDenied(DenialReason),

    #[error("License transport failure: {message}")]
    LicenseTransport {
        status: Option<u16>,
        message: String,
    },

    #[error("Content key unwrap failed: {0}")]
    KeyUnwrap(String),

    #[error("Content fetch failed: {message}")]
    ContentFetch {
        status: Option<u16>,
        message: String,
    },

    #[error("Envelope malformed: {0}")]
    EnvelopeMalformed(String),

    #[error("Decryption integrity check failed")]
    DecryptionIntegrity,

    #[error("Unsupported content format")]
    UnsupportedFormat,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Timed out during {stage}")]
    Timeout { stage: Stage },

    #[error("Session cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Machine-readable error kind for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    KeyGenerationFailure,
    LicenseDenied,
    LicenseTransportFailure,
    KeyUnwrapFailure,
    ContentFetchFailure,
    EnvelopeMalformed,
    DecryptionIntegrityFailure,
    UnsupportedFormat,
    EncryptionFailure,
    Timeout,
    Cancelled,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::KeyGenerationFailure => "key_generation_failure",
            ErrorKind::LicenseDenied => "license_denied",
            ErrorKind::LicenseTransportFailure => "license_transport_failure",
            ErrorKind::KeyUnwrapFailure => "key_unwrap_failure",
            ErrorKind::ContentFetchFailure => "content_fetch_failure",
            ErrorKind::EnvelopeMalformed => "envelope_malformed",
            ErrorKind::DecryptionIntegrityFailure => "decryption_integrity_failure",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::EncryptionFailure => "encryption_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DrmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DrmError::KeyGeneration(_) => ErrorKind::KeyGenerationFailure,
            DrmError::LicenseDenied(_) => ErrorKind::LicenseDenied,
            DrmError::LicenseTransport { .. } => ErrorKind::LicenseTransportFailure,
            DrmError::KeyUnwrap(_) => ErrorKind::KeyUnwrapFailure,
            DrmError::ContentFetch { .. } => ErrorKind::ContentFetchFailure,
            DrmError::EnvelopeMalformed(_) => ErrorKind::EnvelopeMalformed,
            DrmError::DecryptionIntegrity => ErrorKind::DecryptionIntegrityFailure,
            DrmError::UnsupportedFormat => ErrorKind::UnsupportedFormat,
            DrmError::Encryption(_) => ErrorKind::EncryptionFailure,
            DrmError::Timeout { .. } => ErrorKind::Timeout,
            DrmError::Cancelled => ErrorKind::Cancelled,
            DrmError::Config(_) => ErrorKind::Config,
        }
    }

    /// The text a renderer should show. Never carries failure details.
    pub fn user_message(&self) -> &'static str {
        USER_MESSAGE
    }

    /// Whether repeating the same network call could succeed.
    ///
    /// Only transport-level failures qualify: no status (connection reset,
    /// DNS, ...), 408, 429 and 5xx. Cryptographic failures never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            DrmError::LicenseTransport { status, .. } | DrmError::ContentFetch { status, .. } => {
                match status {
                    None => true,
                    Some(code) => *code >= 500 || *code == 429 || *code == 408,
                }
            }
            DrmError::Timeout { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DrmError>;
