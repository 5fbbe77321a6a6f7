use chrono::{DateTime, Utc};
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::sample::sample_articles;
use super::types::{Article, ArticleOrigin, FetchOutcome, DESCRIPTION_PLACEHOLDER, IMAGE_PLACEHOLDER};
use super::ArticleSource;
use crate::config::Config;
use crate::util::strip_control_chars;

const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("No news API key configured")]
    MissingApiKey,
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Malformed response: no articles array")]
    MissingArticles,
    #[error("News API error ({code}): {message}")]
    Api { code: String, message: String },
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Option<Vec<RemoteArticle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    source: Option<RemoteSource>,
}

#[derive(Debug, Deserialize)]
struct RemoteSource {
    name: Option<String>,
}

impl RemoteArticle {
    /// `None` when the record has no url to identify it by.
    fn into_article(self, fetched_at: DateTime<Utc>) -> Option<Article> {
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let clean = |s: String| strip_control_chars(&s).into_owned();

        Some(Article {
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .map(clean)
                .unwrap_or_else(|| "Untitled".to_string()),
            description: self
                .description
                .filter(|d| !d.trim().is_empty())
                .map(clean)
                .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string()),
            url,
            image: self
                .url_to_image
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| IMAGE_PLACEHOLDER.to_string()),
            published_at: self
                .published_at
                .and_then(|p| DateTime::parse_from_rfc3339(&p).ok())
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or(fetched_at),
            source: self.source.and_then(|s| s.name).map(clean),
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// Remote news lookup by city name with a sample-data fallback.
pub struct NewsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    language: String,
    page_size: u32,
    timeout_secs: u64,
}

impl NewsClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.news_base_url.clone(),
            api_key: config.resolve_api_key(),
            language: config.language.clone(),
            page_size: config.page_size,
            timeout_secs: config.request_timeout_secs,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the lookup URL for `city`.
    ///
    /// Non-HTTPS base URLs are rejected unless they point at localhost.
    fn search_url(&self, city: &str, api_key: &SecretString) -> Result<Url, NewsError> {
        let base = self.base_url.trim_end_matches('/');
        if !base.starts_with("https://") {
            let is_localhost =
                base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
            if !is_localhost {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS base URL (HTTPS required except for localhost)");
                return Err(NewsError::InsecureBaseUrl);
            }
        }

        let mut url = Url::parse(&format!("{base}/everything"))?;
        url.query_pairs_mut()
            .append_pair("q", city)
            .append_pair("language", &self.language)
            .append_pair("sortBy", "publishedAt")
            .append_pair("pageSize", &self.page_size.to_string())
            .append_pair("apiKey", api_key.expose_secret());
        Ok(url)
    }

    /// Query the remote API for `city`.
    ///
    /// # Errors
    ///
    /// Any failure of the lookup; see [`NewsError`]. No retries.
    pub async fn fetch_remote(&self, city: &str) -> Result<Vec<Article>, NewsError> {
        let api_key = self.api_key.as_ref().ok_or(NewsError::MissingApiKey)?;
        let url = self.search_url(city, api_key)?;

        let response = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.http.get(url).send(),
        )
        .await
        .map_err(|_| NewsError::Timeout(self.timeout_secs))?
        .map_err(NewsError::Network)?;

        let status = response.status();
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        if !status.is_success() {
            // The API explains 4xx failures in the body; keep that if present
            if let Ok(body) = serde_json::from_slice::<SearchResponse>(&bytes) {
                if let (Some(code), Some(message)) = (body.code, body.message) {
                    return Err(NewsError::Api { code, message });
                }
            }
            return Err(NewsError::HttpStatus(status.as_u16()));
        }

        let body: SearchResponse = serde_json::from_slice(&bytes)?;
        if body.status.as_deref() == Some("error") {
            return Err(NewsError::Api {
                code: body.code.unwrap_or_else(|| "unknown".to_string()),
                message: body.message.unwrap_or_default(),
            });
        }

        let fetched_at = Utc::now();
        let remote = body.articles.ok_or(NewsError::MissingArticles)?;
        let total = remote.len();
        let articles: Vec<Article> = remote
            .into_iter()
            .filter_map(|a| a.into_article(fetched_at))
            .collect();

        if articles.len() < total {
            tracing::debug!(
                city = %city,
                skipped = total - articles.len(),
                "Remote articles without url skipped"
            );
        }

        Ok(articles)
    }
}

impl ArticleSource for NewsClient {
    async fn fetch_articles(&self, city: &str) -> FetchOutcome {
        match self.fetch_remote(city).await {
            Ok(articles) => {
                tracing::debug!(city = %city, count = articles.len(), "Fetched remote articles");
                FetchOutcome {
                    articles,
                    origin: ArticleOrigin::Remote,
                }
            }
            Err(e) => {
                tracing::warn!(city = %city, error = %e, "News lookup failed, using sample articles");
                FetchOutcome {
                    articles: sample_articles(city),
                    origin: ArticleOrigin::Fallback {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, NewsError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(NewsError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(NewsError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(NewsError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
