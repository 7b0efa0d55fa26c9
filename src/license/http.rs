/// HTTP license client: `POST {base}/license`.
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info};

use super::{LicenseRequest, LicenseResponse, LicenseResponseBody, LicenseService};
use crate::error::{DenialReason, DrmError, Result, Stage};
use crate::net::{self, NetOptions};

pub struct HttpLicenseClient {
    client: Client,
    url: Url,
    options: NetOptions,
}

impl HttpLicenseClient {
    pub fn new(base_url: &Url, options: NetOptions) -> Result<Self> {
        Ok(Self {
            client: options.build_client()?,
            url: net::endpoint(base_url, &["license"])?,
            options,
        })
    }

    async fn send_once(&self, request: &LicenseRequest) -> Result<LicenseResponse> {
        let mut builder = self.client.post(self.url.clone()).json(request);
        if let Some(token) = &self.options.auth_token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| net::transport_error(Stage::License, e))?;

        let status = resp.status();
        if let Some(reason) = denial_reason(status) {
            return Err(DrmError::LicenseDenied(reason));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DrmError::LicenseTransport {
                status: Some(status.as_u16()),
                message: format!("license service returned {status}: {body}"),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| net::transport_error(Stage::License, e))?;

        let license = parse_license_body(status, &body)?;
        debug!(wrapped_len = license.wrapped_content_key.len(), "License received");

        Ok(license)
    }
}

/// Decode a complete success body. Only called once the transport is done,
/// so every failure here is about content, never about timing.
fn parse_license_body(status: StatusCode, body: &[u8]) -> Result<LicenseResponse> {
    let body: LicenseResponseBody =
        serde_json::from_slice(body).map_err(|e| DrmError::LicenseTransport {
            status: Some(status.as_u16()),
            message: format!("license response parse error: {e}"),
        })?;

    let wrapped_content_key = STANDARD
        .decode(body.wrapped_content_key.trim())
        .map_err(|e| DrmError::KeyUnwrap(format!("wrapped key is not base64: {e}")))?;

    Ok(LicenseResponse {
        wrapped_content_key,
    })
}

fn denial_reason(status: StatusCode) -> Option<DenialReason> {
    match status {
        StatusCode::UNAUTHORIZED => Some(DenialReason::Unauthorized),
        StatusCode::FORBIDDEN => Some(DenialReason::Forbidden),
        StatusCode::NOT_FOUND => Some(DenialReason::NotFound),
        _ => None,
    }
}

#[async_trait]
impl LicenseService for HttpLicenseClient {
    async fn request_license(&self, request: LicenseRequest) -> Result<LicenseResponse> {
        info!(
            content_id = %request.content_id,
            device_id = %request.device_id,
            "Requesting license"
        );

        net::with_retry(&self.options.retry_policy, Stage::License, || {
            net::with_timeout(
                Stage::License,
                self.options.request_timeout,
                self.send_once(&request),
            )
        })
        .await
    }
}
