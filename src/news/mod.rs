//! Article sources: the remote news lookup and its sample-data fallback.
//!
//! - [`client`] - remote lookup by city name ([`NewsClient`])
//! - [`sample`] - deterministic fallback dataset ([`sample_articles`])
//!
//! Every [`ArticleSource`] always yields a list. Failures are logged and
//! replaced by the sample dataset, never returned to the caller.

mod client;
mod sample;
mod types;

use std::future::Future;

pub use client::{NewsClient, NewsError};
pub use sample::{sample_articles, sample_articles_at, slugify, SAMPLE_SIZE};
pub use types::{Article, ArticleOrigin, FetchOutcome, DESCRIPTION_PLACEHOLDER, IMAGE_PLACEHOLDER};

/// Produces the article list for a city.
pub trait ArticleSource {
    fn fetch_articles(&self, city: &str) -> impl Future<Output = FetchOutcome> + Send;
}

/// Source that never touches the network and always serves sample data.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl ArticleSource for OfflineSource {
    async fn fetch_articles(&self, city: &str) -> FetchOutcome {
        FetchOutcome {
            articles: sample_articles(city),
            origin: ArticleOrigin::Fallback {
                reason: "offline mode".to_string(),
            },
        }
    }
}
