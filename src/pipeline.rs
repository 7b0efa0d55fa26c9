/// Document-open pipeline.
///
/// Coordinates one secure open:
/// 1. Generate an ephemeral RSA key pair (before any network call)
/// 2. Request a license with the public key, concurrently fetch the envelope
/// 3. Unwrap the content key with the private key
/// 4. Derive the AEAD key and decrypt the envelope
/// 5. Resolve the payload's true format
///
/// Key pairs, content keys and plaintext belong to exactly one
/// `DocumentSession`; nothing is cached between sessions. Any stage failure
/// ends the session with a single error and no partial payload.
use std::sync::Arc;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::config::ClientConfig;
use crate::content::{ContentSource, HttpContentFetcher};
use crate::crypto::keys::{KeyPair, RSA_MODULUS_BITS};
use crate::crypto::sensitive::ContentKey;
use crate::crypto::{content, unwrap};
use crate::error::{DrmError, Result};
use crate::license::{HttpLicenseClient, LicenseRequest, LicenseService};
use crate::resolver::{self, ResolvedType};

/// Plaintext ready for a renderer. Wiped from memory on drop.
pub struct DecryptedPayload {
    bytes: Vec<u8>,
    resolved_type: ResolvedType,
}

impl DecryptedPayload {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn resolved_type(&self) -> ResolvedType {
        self.resolved_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hand the bytes to the caller, who then owns wiping them.
    pub fn into_bytes(mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }
}

impl Drop for DecryptedPayload {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DecryptedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedPayload")
            .field("len", &self.bytes.len())
            .field("resolved_type", &self.resolved_type)
            .finish()
    }
}

/// Long-lived entry point holding the (stateless) network clients.
#[derive(Clone)]
pub struct Pipeline {
    device_id: String,
    license: Arc<dyn LicenseService>,
    content: Arc<dyn ContentSource>,
    key_bits: usize,
}

impl Pipeline {
    pub fn new(
        device_id: impl Into<String>,
        license: Arc<dyn LicenseService>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            license,
            content,
            key_bits: RSA_MODULUS_BITS,
        }
    }

    /// Build HTTP clients from a validated configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url()?;
        let options = config.net_options();

        let license = HttpLicenseClient::new(&base_url, options.clone())?;
        let content = HttpContentFetcher::new(&base_url, options)?;

        Ok(Self::new(
            config.device_id.clone(),
            Arc::new(license),
            Arc::new(content),
        ))
    }

    /// Use a larger RSA modulus for session key pairs.
    pub fn with_key_bits(mut self, bits: usize) -> Self {
        self.key_bits = bits;
        self
    }

    /// Start a new, single-use session for `content_id`.
    pub fn session(&self, content_id: &str) -> DocumentSession {
        DocumentSession {
            id: Uuid::now_v7(),
            content_id: content_id.to_string(),
            device_id: self.device_id.clone(),
            license: Arc::clone(&self.license),
            content: Arc::clone(&self.content),
            key_bits: self.key_bits,
            cancel: CancellationToken::new(),
        }
    }

    /// Open `content_id` in a fresh session.
    pub async fn open(&self, content_id: &str) -> Result<DecryptedPayload> {
        self.session(content_id).open().await
    }
}

/// One document-open action. Consumed by [`DocumentSession::open`].
pub struct DocumentSession {
    id: Uuid,
    content_id: String,
    device_id: String,
    license: Arc<dyn LicenseService>,
    content: Arc<dyn ContentSource>,
    key_bits: usize,
    cancel: CancellationToken,
}

impl DocumentSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Token a view can keep to dispose the session while `open` runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Run the pipeline to completion, or until cancelled.
    ///
    /// Cancellation drops every in-flight request; work already handed to
    /// the blocking pool finishes but its result is discarded.
    pub async fn open(self) -> Result<DecryptedPayload> {
        let cancel = self.cancel.clone();
        let session_id = self.id;
        let content_id = self.content_id.clone();

        info!(session_id = %session_id, content_id = %content_id, "Opening document");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DrmError::Cancelled),
            result = self.run() => result,
        };

        match &result {
            Ok(payload) => info!(
                session_id = %session_id,
                content_id = %content_id,
                resolved_type = %payload.resolved_type(),
                len = payload.len(),
                "Document opened"
            ),
            Err(e) => warn!(
                session_id = %session_id,
                content_id = %content_id,
                kind = %e.kind(),
                error = %e,
                "Document open failed"
            ),
        }

        result
    }

    async fn run(self) -> Result<DecryptedPayload> {
        let key_bits = self.key_bits;
        let key_pair = on_blocking_pool(
            move || KeyPair::generate_with_bits(key_bits),
            |e| DrmError::KeyGeneration(format!("key generation task failed: {e}")),
        )
        .await?;

        let request = LicenseRequest::new(
            &self.content_id,
            &self.device_id,
            key_pair.public_key_base64(),
        );

        let license = self.license.as_ref();
        let key_fut = async move {
            let response = license.request_license(request).await?;
            unwrap_on_blocking_pool(response.wrapped_content_key, key_pair).await
        };
        let fetch_fut = self.content.fetch(&self.content_id);

        let (content_key, fetched) = tokio::try_join!(key_fut, fetch_fut)?;
        let declared_type = fetched.declared_type;
        let envelope = fetched.bytes;

        let mut plaintext = on_blocking_pool(
            move || content::decrypt(&envelope, &content_key),
            decrypt_task_failed,
        )
        .await?;

        let resolved_type = resolver::resolve(declared_type.as_deref(), &plaintext);
        if resolved_type == ResolvedType::Unknown {
            plaintext.zeroize();
            return Err(DrmError::UnsupportedFormat);
        }

        Ok(DecryptedPayload {
            bytes: plaintext,
            resolved_type,
        })
    }
}

/// Unwrap off the async runtime; the key pair is dropped on the blocking
/// thread as soon as the secret is recovered.
async fn unwrap_on_blocking_pool(wrapped: Vec<u8>, key_pair: KeyPair) -> Result<ContentKey> {
    on_blocking_pool(
        move || unwrap::unwrap_content_key(&wrapped, key_pair.private_key()),
        |e| DrmError::KeyUnwrap(format!("unwrap task failed: {e}")),
    )
    .await
}

/// Run CPU-bound crypto on the blocking pool. A task that panics or is
/// aborted is reported through `on_join_error` as a failure of its own stage.
async fn on_blocking_pool<T, F>(task: F, on_join_error: fn(JoinError) -> DrmError) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(on_join_error)?
}

/// A decrypt task that never returned produced no authenticated plaintext.
fn decrypt_task_failed(error: JoinError) -> DrmError {
    warn!(error = %error, "Decryption task failed");
    DrmError::DecryptionIntegrity
}
