use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown when a remote article has no description.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description available";

/// Shown when a remote article has no image.
pub const IMAGE_PLACEHOLDER: &str = "https://via.placeholder.com/400x250?text=No+Image";

/// A news article as shown in the feed.
///
/// `url` is the identity: two articles are the same entity iff their urls
/// are equal, whatever the other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    pub url: String,
    #[serde(default = "default_image")]
    pub image: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<String>,
}

fn default_description() -> String {
    DESCRIPTION_PLACEHOLDER.to_string()
}

fn default_image() -> String {
    IMAGE_PLACEHOLDER.to_string()
}

/// Where a fetched article list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOrigin {
    /// The remote news lookup answered
    Remote,
    /// The lookup failed and the sample dataset was substituted
    Fallback { reason: String },
}

/// Articles produced for one city by an [`ArticleSource`](super::ArticleSource).
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub articles: Vec<Article>,
    pub origin: ArticleOrigin,
}

impl FetchOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, ArticleOrigin::Fallback { .. })
    }
}
