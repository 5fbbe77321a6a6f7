use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::news::Article;

// ============================================================================
// Error Types
// ============================================================================

/// Storage errors with user-friendly messages
#[derive(Debug, Error)]
pub enum StorageError {
    /// Another instance of the application has locked the database
    #[error("Another instance of citypulse appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Persisted value exists but cannot be decoded
    #[error("Stored data under '{key}' is unreadable: {source}")]
    Read {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be written; the previous value is still in place
    #[error("Could not save '{key}': {message}")]
    Write { key: String, message: String },

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl StorageError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return StorageError::InstanceLocked;
        }
        StorageError::Other(err)
    }

    /// True for failures the user should hear about ("could not save").
    pub fn is_write_failure(&self) -> bool {
        matches!(self, StorageError::Write { .. })
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all surface
/// through the message text only.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

// ============================================================================
// Bookmarks
// ============================================================================

/// An article saved by the user, tagged with the city that was active when
/// the bookmark was created.
///
/// Serializes flat: `{title, description, url, image, publishedAt, source, city}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    #[serde(flatten)]
    pub article: Article,
    pub city: String,
}

impl BookmarkRecord {
    pub fn new(article: Article, city: &str) -> Self {
        Self {
            article,
            city: city.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.article.url
    }
}

/// Ordered bookmarks of a single city.
///
/// Urls are unique within a collection; insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkCollection {
    city: String,
    records: Vec<BookmarkRecord>,
}

impl BookmarkCollection {
    pub fn empty(city: &str) -> Self {
        Self {
            city: city.to_string(),
            records: Vec::new(),
        }
    }

    /// Build a collection from persisted records, keeping the first record
    /// for any url that appears more than once.
    pub fn from_records(city: &str, records: Vec<BookmarkRecord>) -> Self {
        let before = records.len();
        let mut seen = HashSet::with_capacity(records.len());
        let records: Vec<BookmarkRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.article.url.clone()))
            .collect();

        if records.len() < before {
            tracing::debug!(
                city = %city,
                dropped = before - records.len(),
                "Dropped duplicate bookmark records"
            );
        }

        Self {
            city: city.to_string(),
            records,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn records(&self) -> &[BookmarkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookmarkRecord> {
        self.records.iter()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.records.iter().any(|r| r.article.url == url)
    }

    /// Url set used to cross-reference a feed against this collection.
    pub fn urls(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.article.url.as_str()).collect()
    }

    /// Remove the record for `article.url` if present, otherwise append a
    /// new record for `article`. Returns true when a record was added.
    pub(crate) fn toggle(&mut self, article: &Article) -> bool {
        if self.contains(&article.url) {
            self.remove(&article.url);
            false
        } else {
            self.records
                .push(BookmarkRecord::new(article.clone(), &self.city));
            true
        }
    }

    pub(crate) fn remove(&mut self, url: &str) {
        self.records.retain(|r| r.article.url != url);
    }
}
