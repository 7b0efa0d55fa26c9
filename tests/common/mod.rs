#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use content_shield::crypto::content::seal;
use content_shield::crypto::keys::wrap_content_key;
use content_shield::crypto::sensitive::ContentKey;
use content_shield::license::{LicenseRequest, LicenseResponseBody};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const SECRET: &[u8] = b"Zq9xP3mW7tY1bN5cV8kL2hJ4gF6dS0aR1eU3oI5pQ7w=";

// ============================================================================
// Test server infrastructure
// ============================================================================

pub struct TestServer {
    pub base_url: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });

        tokio::spawn(async move {
            server.await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

// ============================================================================
// Stalled body server
// ============================================================================

/// Raw HTTP/1.1 listener that answers every request with `200 OK` headers
/// announcing a 100-byte JSON body, writes a few bytes of it and then holds
/// the connection open without finishing.
pub struct StalledBodyServer {
    pub base_url: String,
    pub connections: Arc<AtomicU32>,
    task: tokio::task::JoinHandle<()>,
}

impl StalledBodyServer {
    pub async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&connections);
        let task = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 8192];
                    let _ = socket.read(&mut buf).await;
                    let head = "HTTP/1.1 200 OK\r\n\
                                content-type: application/json\r\n\
                                content-length: 100\r\n\r\n\
                                {\"wrappedCont";
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.flush().await;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    drop(socket);
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            connections,
            task,
        }
    }
}

impl Drop for StalledBodyServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// License issuer + content store
// ============================================================================

#[derive(Clone, Default)]
pub struct Behavior {
    /// Status returned by `/license` instead of a license.
    pub license_status: Option<StatusCode>,
    /// Number of initial `/license` calls answered with 503.
    pub license_transient_failures: u32,
    /// Wrap against this SPKI key instead of the requester's.
    pub wrap_for: Option<Vec<u8>>,
    /// Replace the wrapped key with this literal string.
    pub wrapped_override: Option<String>,
    /// Bearer token both endpoints insist on.
    pub required_token: Option<String>,
    /// Sleep before answering `/license`.
    pub license_delay: Duration,
    /// Status returned by `/content/{id}` instead of the body.
    pub content_status: Option<StatusCode>,
    pub content_delay: Duration,
}

#[derive(Clone)]
pub struct Issuer {
    behavior: Behavior,
    documents: Arc<HashMap<String, (Vec<u8>, &'static str)>>,
    pub license_calls: Arc<AtomicU32>,
    pub content_calls: Arc<AtomicU32>,
}

impl Issuer {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            documents: Arc::new(HashMap::new()),
            license_calls: Arc::new(AtomicU32::new(0)),
            content_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Register a document, sealing it under [`SECRET`].
    pub fn with_document(self, id: &str, plaintext: &[u8], content_type: &'static str) -> Self {
        let envelope = seal(plaintext, &ContentKey::new(SECRET.to_vec())).unwrap();
        self.with_raw_document(id, envelope, content_type)
    }

    /// Register an already-built (possibly corrupt) envelope.
    pub fn with_raw_document(mut self, id: &str, body: Vec<u8>, content_type: &'static str) -> Self {
        Arc::make_mut(&mut self.documents).insert(id.to_string(), (body, content_type));
        self
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/license", post(license))
            .route("/content/{id}", get(content))
            .with_state(self.clone())
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        match &self.behavior.required_token {
            None => true,
            Some(token) => headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|v| v == format!("Bearer {token}"))
                .unwrap_or(false),
        }
    }
}

async fn license(
    State(issuer): State<Issuer>,
    headers: HeaderMap,
    Json(req): Json<LicenseRequest>,
) -> Response {
    let call = issuer.license_calls.fetch_add(1, Ordering::SeqCst);

    if !issuer.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    tokio::time::sleep(issuer.behavior.license_delay).await;
    if let Some(status) = issuer.behavior.license_status {
        return status.into_response();
    }
    if call < issuer.behavior.license_transient_failures {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if !issuer.documents.contains_key(&req.content_id) {
        return StatusCode::NOT_FOUND.into_response();
    }

    if let Some(literal) = &issuer.behavior.wrapped_override {
        return Json(LicenseResponseBody {
            wrapped_content_key: literal.clone(),
        })
        .into_response();
    }

    let spki = match &issuer.behavior.wrap_for {
        Some(spki) => spki.clone(),
        None => match STANDARD.decode(&req.public_key) {
            Ok(spki) => spki,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        },
    };
    let wrapped = match wrap_content_key(&spki, SECRET) {
        Ok(wrapped) => wrapped,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    Json(LicenseResponseBody {
        wrapped_content_key: STANDARD.encode(wrapped),
    })
    .into_response()
}

async fn content(
    State(issuer): State<Issuer>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    issuer.content_calls.fetch_add(1, Ordering::SeqCst);

    if !issuer.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = issuer.behavior.content_status {
        return status.into_response();
    }
    tokio::time::sleep(issuer.behavior.content_delay).await;

    match issuer.documents.get(&id) {
        Some((body, content_type)) => {
            ([(header::CONTENT_TYPE, *content_type)], body.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
