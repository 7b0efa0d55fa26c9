/// Shared HTTP plumbing for the license and content clients.
///
/// Every call is bounded twice: reqwest's own client timeout and an outer
/// `tokio::time::timeout`, both surfacing as `DrmError::Timeout`. Retries
/// are opt-in and only apply to errors `DrmError::is_retryable` accepts.
use std::cmp::min;
use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use tokio::time::sleep;
use tracing::warn;

use crate::error::{DrmError, Result, Stage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// No retries: one attempt per call.
    pub fn none() -> Self {
        Self::new(0, Duration::from_millis(100), Duration::from_secs(5))
    }

    /// Delay before `attempt` (0-based). The first attempt never waits;
    /// after that the delay doubles from `base_delay` up to `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(attempt - 1);
        min(self.base_delay.saturating_mul(factor), self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct NetOptions {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub auth_token: Option<String>,
}

impl Default for NetOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry_policy: RetryPolicy::none(),
            auth_token: None,
        }
    }
}

impl NetOptions {
    pub fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| DrmError::Config(format!("HTTP client setup failed: {e}")))
    }
}

/// Append path segments to `base`, percent-encoding each one.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DrmError::Config(format!("base URL {base} cannot carry paths")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Bound `fut` by `limit`, mapping expiry to `Timeout { stage }`.
pub async fn with_timeout<T, F>(stage: Stage, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DrmError::Timeout { stage })?
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted. The last error is returned unchanged.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, stage: Stage, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    stage = %stage,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying request"
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Map a reqwest failure for `stage`, keeping timeouts distinct.
pub fn transport_error(stage: Stage, error: reqwest::Error) -> DrmError {
    if error.is_timeout() {
        return DrmError::Timeout { stage };
    }
    let status = error.status().map(|s| s.as_u16());
    let message = error.to_string();
    match stage {
        Stage::License => DrmError::LicenseTransport { status, message },
        Stage::Content => DrmError::ContentFetch { status, message },
    }
}
