/// HTTP content fetcher: `GET {base}/content/{content_id}`.
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, info};

use super::{ContentSource, FetchedContent};
use crate::error::{DrmError, Result, Stage};
use crate::net::{self, NetOptions};

pub struct HttpContentFetcher {
    client: Client,
    base_url: Url,
    options: NetOptions,
}

impl HttpContentFetcher {
    pub fn new(base_url: &Url, options: NetOptions) -> Result<Self> {
        Ok(Self {
            client: options.build_client()?,
            base_url: base_url.clone(),
            options,
        })
    }

    fn content_url(&self, content_id: &str) -> Result<Url> {
        net::endpoint(&self.base_url, &["content", content_id])
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedContent> {
        let mut builder = self.client.get(url.clone());
        if let Some(token) = &self.options.auth_token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| net::transport_error(Stage::Content, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DrmError::ContentFetch {
                status: Some(status.as_u16()),
                message: format!("content endpoint returned {status}"),
            });
        }

        let declared_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| net::transport_error(Stage::Content, e))?;

        debug!(
            len = bytes.len(),
            declared_type = declared_type.as_deref().unwrap_or("<none>"),
            "Content received"
        );

        Ok(FetchedContent {
            bytes: bytes.to_vec(),
            declared_type,
        })
    }
}

#[async_trait]
impl ContentSource for HttpContentFetcher {
    async fn fetch(&self, content_id: &str) -> Result<FetchedContent> {
        info!(content_id = %content_id, "Fetching content");

        let url = self.content_url(content_id)?;
        net::with_retry(&self.options.retry_policy, Stage::Content, || {
            net::with_timeout(
                Stage::Content,
                self.options.request_timeout,
                self.fetch_once(&url),
            )
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_url_encodes_id() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let fetcher = HttpContentFetcher::new(&base, NetOptions::default()).unwrap();
        assert_eq!(
            fetcher.content_url("reports/q3 final").unwrap().as_str(),
            "http://localhost:8080/content/reports%2Fq3%20final"
        );
    }
}
