/// License exchange with the license service.
///
/// The client sends its freshly generated SPKI public key; the service
/// decides authorization and wraps the content key against exactly that key.
/// Implementations perform at most the retries their `RetryPolicy` allows
/// and never retry a denial.
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use http::HttpLicenseClient;

/// Body of `POST /license`. Built once per session and then consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRequest {
    pub content_id: String,
    pub device_id: String,
    /// Base64 of the SPKI DER public key.
    pub public_key: String,
}

impl LicenseRequest {
    pub fn new(content_id: &str, device_id: &str, public_key: String) -> Self {
        Self {
            content_id: content_id.to_string(),
            device_id: device_id.to_string(),
            public_key,
        }
    }
}

/// Wire body returned by the license service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseResponseBody {
    /// Base64 of the RSA-OAEP ciphertext.
    pub wrapped_content_key: String,
}

/// A decoded license: the wrapped content key, one modulus in length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseResponse {
    pub wrapped_content_key: Vec<u8>,
}

#[async_trait]
pub trait LicenseService: Send + Sync {
    /// Exchange a public key for a wrapped content key.
    ///
    /// Errors: `LicenseDenied` (401/403/404), `LicenseTransport`, `Timeout`.
    async fn request_license(&self, request: LicenseRequest) -> Result<LicenseResponse>;
}
