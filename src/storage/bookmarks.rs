//! City-scoped bookmark persistence.
//!
//! Each city owns one JSON array stored under [`bookmark_key`]. Collections
//! are independent: toggling in one city never touches another city's key.

use super::schema::Database;
use super::types::{BookmarkCollection, BookmarkRecord, StorageError};
use crate::news::Article;

/// Prefix of every per-city bookmark key.
pub const BOOKMARK_KEY_PREFIX: &str = "bookmarks_";

/// Storage key for a city's bookmark collection.
///
/// This is the only place the key layout is decided.
pub fn bookmark_key(city: &str) -> String {
    format!("{BOOKMARK_KEY_PREFIX}{city}")
}

/// Result of [`BookmarkStore::toggle`].
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    /// The collection as persisted after the toggle
    pub collection: BookmarkCollection,
    /// True if the article was added, false if it was removed
    pub was_added: bool,
}

/// Per-city bookmark collections over the key-value store.
#[derive(Clone)]
pub struct BookmarkStore {
    db: Database,
}

impl BookmarkStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn get(&self, city: &str) -> Result<BookmarkCollection, StorageError> {
        let key = bookmark_key(city);
        match self.db.get_value(&key).await? {
            None => Ok(BookmarkCollection::empty(city)),
            Some(raw) => {
                let records: Vec<BookmarkRecord> =
                    serde_json::from_str(&raw).map_err(|source| StorageError::Read { key, source })?;
                Ok(BookmarkCollection::from_records(city, records))
            }
        }
    }

    async fn put(&self, collection: &BookmarkCollection) -> Result<(), StorageError> {
        let key = bookmark_key(collection.city());
        let raw = serde_json::to_string(collection.records()).map_err(|e| StorageError::Write {
            key: key.clone(),
            message: e.to_string(),
        })?;
        self.db.put_value(&key, &raw).await
    }

    /// Read the persisted collection for `city`.
    ///
    /// A city that was never written yields an empty collection.
    ///
    /// # Errors
    ///
    /// [`StorageError::Read`] if the persisted value cannot be decoded.
    pub async fn load(&self, city: &str) -> Result<BookmarkCollection, StorageError> {
        self.get(city).await
    }

    /// Like [`load`](Self::load), but unreadable data is logged and treated
    /// as an empty collection.
    pub async fn load_or_empty(&self, city: &str) -> BookmarkCollection {
        match self.get(city).await {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(city = %city, error = %e, "Failed to load bookmarks, treating as empty");
                BookmarkCollection::empty(city)
            }
        }
    }

    /// Current collection as the base of a rewrite.
    ///
    /// Undecodable data counts as empty so the rewrite replaces it. Any other
    /// read failure is returned: rewriting from an empty base would drop
    /// every existing record.
    async fn load_for_update(&self, city: &str) -> Result<BookmarkCollection, StorageError> {
        match self.get(city).await {
            Err(e @ StorageError::Read { .. }) => {
                tracing::warn!(city = %city, error = %e, "Replacing unreadable bookmarks");
                Ok(BookmarkCollection::empty(city))
            }
            other => other,
        }
    }

    /// True iff `city`'s collection holds a record with this url.
    pub async fn is_bookmarked(&self, city: &str, url: &str) -> bool {
        self.load_or_empty(city).await.contains(url)
    }

    /// Add `article` to `city`'s bookmarks, or remove it if its url is
    /// already present. The whole collection is rewritten in one upsert.
    ///
    /// # Errors
    ///
    /// [`StorageError::Write`] if the updated collection could not be saved;
    /// the persisted collection is then unchanged. Read failures other than
    /// undecodable data abort before anything is written.
    pub async fn toggle(&self, city: &str, article: &Article) -> Result<ToggleOutcome, StorageError> {
        let mut collection = self.load_for_update(city).await?;
        let was_added = collection.toggle(article);
        self.put(&collection).await?;

        tracing::debug!(
            city = %city,
            url = %article.url,
            was_added,
            total = collection.len(),
            "Bookmark toggled"
        );

        Ok(ToggleOutcome {
            collection,
            was_added,
        })
    }

    /// Remove the record with `url` from `city`'s bookmarks and persist the
    /// result. Removing a url that is not bookmarked still writes.
    pub async fn remove(&self, city: &str, url: &str) -> Result<BookmarkCollection, StorageError> {
        let mut collection = self.load_for_update(city).await?;
        collection.remove(url);
        self.put(&collection).await?;

        tracing::debug!(city = %city, url = %url, total = collection.len(), "Bookmark removed");
        Ok(collection)
    }

    /// Cities that have a persisted bookmark collection, ordered by name.
    pub async fn cities(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.db.keys_with_prefix(BOOKMARK_KEY_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(BOOKMARK_KEY_PREFIX).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::sample_articles;
    use pretty_assertions::assert_eq;

    async fn test_store() -> (Database, BookmarkStore) {
        let db = Database::open(":memory:").await.unwrap();
        (db.clone(), BookmarkStore::new(db))
    }

    #[test]
    fn test_bookmark_key_layout() {
        assert_eq!(bookmark_key("Paris"), "bookmarks_Paris");
        assert_eq!(bookmark_key("New York"), "bookmarks_New York");
    }

    #[tokio::test]
    async fn test_load_unknown_city_is_empty() {
        let (_db, store) = test_store().await;
        let collection = store.load("Dubai").await.unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.city(), "Dubai");
    }

    #[tokio::test]
    async fn test_toggle_persists_record_tagged_with_city() {
        let (db, store) = test_store().await;
        let article = sample_articles("Paris").remove(0);

        let outcome = store.toggle("Paris", &article).await.unwrap();
        assert!(outcome.was_added);
        assert_eq!(outcome.collection.len(), 1);

        let raw = db.get_value("bookmarks_Paris").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["url"], article.url.as_str());
        assert_eq!(value[0]["city"], "Paris");
    }

    #[tokio::test]
    async fn test_toggle_twice_removes() {
        let (_db, store) = test_store().await;
        let article = sample_articles("Paris").remove(3);

        store.toggle("Paris", &article).await.unwrap();
        let outcome = store.toggle("Paris", &article).await.unwrap();

        assert!(!outcome.was_added);
        assert!(!store.is_bookmarked("Paris", &article.url).await);
    }

    #[tokio::test]
    async fn test_retoggle_with_different_payload_removes_by_url() {
        let (_db, store) = test_store().await;
        let original = sample_articles("Paris").remove(1);
        let mut edited = original.clone();
        edited.title = "Edited headline".to_string();
        edited.source = None;

        store.toggle("Paris", &original).await.unwrap();
        let outcome = store.toggle("Paris", &edited).await.unwrap();

        assert!(!outcome.was_added);
        assert!(store.load("Paris").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cities_are_independent() {
        let (_db, store) = test_store().await;
        let paris = sample_articles("Paris").remove(0);

        store.toggle("Paris", &paris).await.unwrap();

        assert!(store.is_bookmarked("Paris", &paris.url).await);
        assert!(!store.is_bookmarked("Tokyo", &paris.url).await);
        assert!(store.load("Tokyo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_url_still_persists() {
        let (db, store) = test_store().await;

        let collection = store
            .remove("Berlin", "https://example.com/missing")
            .await
            .unwrap();

        assert!(collection.is_empty());
        assert_eq!(
            db.get_value("bookmarks_Berlin").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_read_error() {
        let (db, store) = test_store().await;
        db.put_value("bookmarks_Paris", "{not json").await.unwrap();

        let err = store.load("Paris").await.unwrap_err();
        assert!(matches!(err, StorageError::Read { ref key, .. } if key == "bookmarks_Paris"));

        assert!(store.load_or_empty("Paris").await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_over_corrupt_collection_replaces_it() {
        let (db, store) = test_store().await;
        db.put_value("bookmarks_Paris", "garbage").await.unwrap();
        let article = sample_articles("Paris").remove(0);

        let outcome = store.toggle("Paris", &article).await.unwrap();
        assert!(outcome.was_added);

        let reloaded = store.load("Paris").await.unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    /// Stores a value the TEXT decoder rejects: reads fail with a database
    /// error (not a JSON decode error) while writes still go through.
    async fn store_undecodable_value(db: &Database, key: &str) {
        sqlx::query("UPDATE kv_store SET value = x'ff00ff' WHERE key = ?")
            .bind(key)
            .execute(&db.pool)
            .await
            .unwrap();
    }

    async fn stored_type(db: &Database, key: &str) -> String {
        let (ty,): (String,) = sqlx::query_as("SELECT typeof(value) FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        ty
    }

    #[tokio::test]
    async fn test_toggle_aborts_when_read_fails_for_other_reasons() {
        let (db, store) = test_store().await;
        let articles = sample_articles("Paris");
        for a in &articles[..3] {
            store.toggle("Paris", a).await.unwrap();
        }
        store_undecodable_value(&db, "bookmarks_Paris").await;

        let err = store.toggle("Paris", &articles[3]).await.unwrap_err();
        assert!(matches!(err, StorageError::Other(_)), "got {err:?}");

        // Nothing was written over the unreadable value
        assert_eq!(stored_type(&db, "bookmarks_Paris").await, "blob");

        // The same key is still writable, so only the read blocked the toggle
        db.put_value("bookmarks_Paris", "[]").await.unwrap();
        assert!(store.toggle("Paris", &articles[3]).await.unwrap().was_added);
    }

    #[tokio::test]
    async fn test_remove_aborts_when_read_fails_for_other_reasons() {
        let (db, store) = test_store().await;
        let articles = sample_articles("Tokyo");
        store.toggle("Tokyo", &articles[0]).await.unwrap();
        store.toggle("Tokyo", &articles[1]).await.unwrap();
        store_undecodable_value(&db, "bookmarks_Tokyo").await;

        let err = store.remove("Tokyo", &articles[0].url).await.unwrap_err();
        assert!(!matches!(err, StorageError::Read { .. }));
        assert_eq!(stored_type(&db, "bookmarks_Tokyo").await, "blob");
    }

    #[tokio::test]
    async fn test_toggle_write_failure_keeps_previous_collection() {
        let (db, store) = test_store().await;
        let articles = sample_articles("Paris");
        store.toggle("Paris", &articles[0]).await.unwrap();

        sqlx::query(
            "CREATE TRIGGER kv_read_only BEFORE UPDATE ON kv_store \
             BEGIN SELECT RAISE(ABORT, 'read only'); END",
        )
        .execute(&db.pool)
        .await
        .unwrap();

        let err = store.toggle("Paris", &articles[1]).await.unwrap_err();
        assert!(err.is_write_failure());

        let persisted = store.load("Paris").await.unwrap();
        assert_eq!(persisted.len(), 1);
        assert!(persisted.contains(&articles[0].url));
    }

    #[tokio::test]
    async fn test_toggle_on_closed_database_fails() {
        let (db, store) = test_store().await;
        db.close().await;
        let article = sample_articles("Paris").remove(0);

        assert!(store.toggle("Paris", &article).await.is_err());
    }

    #[tokio::test]
    async fn test_cities_lists_persisted_collections() {
        let (db, store) = test_store().await;
        let article = sample_articles("Sydney").remove(0);
        store.toggle("Sydney", &article).await.unwrap();
        store.remove("Mumbai", "https://example.com/x").await.unwrap();
        db.put_value("selectedCity", "Sydney").await.unwrap();

        assert_eq!(store.cities().await.unwrap(), vec!["Mumbai", "Sydney"]);
    }
}
