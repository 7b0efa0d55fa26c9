/// Retrieval of the still-encrypted document body.
///
/// A fetcher makes no claim about the payload: it hands back whatever bytes
/// the content endpoint served plus its `content-type` hint.
pub mod http;

use async_trait::async_trait;

use crate::error::Result;

pub use http::HttpContentFetcher;

/// Encrypted envelope bytes and the server's declared type.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    /// `content-type` header, if any. Often a generic placeholder.
    pub declared_type: Option<String>,
}

impl std::fmt::Debug for FetchedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedContent")
            .field("len", &self.bytes.len())
            .field("declared_type", &self.declared_type)
            .finish()
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Errors: `ContentFetch` (status carried unmodified), `Timeout`.
    async fn fetch(&self, content_id: &str) -> Result<FetchedContent>;
}
