use std::fmt;

use thiserror::Error;

use crate::news::{Article, ArticleOrigin, ArticleSource, FetchOutcome};
use crate::storage::{BookmarkCollection, BookmarkStore, Database, StorageError};

/// One row of the feed view: an article and whether the active city has it
/// bookmarked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub article: Article,
    pub bookmarked: bool,
}

/// Flag each article of `feed` by url membership in `bookmarks`.
///
/// Output follows `feed` order. Bookmarks missing from `feed` are not added.
pub fn annotate(feed: &[Article], bookmarks: &BookmarkCollection) -> Vec<FeedEntry> {
    let urls = bookmarks.urls();
    feed.iter()
        .map(|article| FeedEntry {
            bookmarked: urls.contains(article.url.as_str()),
            article: article.clone(),
        })
        .collect()
}

/// Short user-facing confirmation for a reconciler action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    BookmarkSaved,
    BookmarkRemoved,
    SampleData,
    SaveFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Notice::BookmarkSaved => "Article saved to bookmarks",
            Notice::BookmarkRemoved => "Article removed from bookmarks",
            Notice::SampleData => "Failed to fetch news. Showing sample data.",
            Notice::SaveFailed => "Could not save bookmarks",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("No city selected")]
    NoActiveCity,
    #[error("City name is blank")]
    BlankCity,
    #[error("Article not in the current feed: {0}")]
    UnknownArticle(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ReconcileError {
    /// Notice to show for this failure, if the user should see one.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            ReconcileError::Storage(_) => Some(Notice::SaveFailed),
            _ => None,
        }
    }
}

/// The city a fetch was started for.
///
/// Handed back to [`FeedReconciler::apply_fetch`] so results for a city that
/// is no longer active can be dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    city: String,
}

impl FetchTicket {
    pub fn city(&self) -> &str {
        &self.city
    }
}

/// Keeps the active city's feed and bookmarks in step.
///
/// The feed and the bookmark collection stay separate sequences; they are
/// only cross-referenced by url to compute each entry's `bookmarked` flag.
/// Flags are re-derived after every fetch, city change, toggle, removal and
/// [`on_view_became_active`](Self::on_view_became_active).
pub struct FeedReconciler<S> {
    db: Database,
    store: BookmarkStore,
    source: S,
    active_city: Option<String>,
    feed: Vec<Article>,
    origin: Option<ArticleOrigin>,
    bookmarks: BookmarkCollection,
    view: Vec<FeedEntry>,
}

impl<S: ArticleSource> FeedReconciler<S> {
    pub fn new(db: Database, source: S) -> Self {
        Self {
            store: BookmarkStore::new(db.clone()),
            db,
            source,
            active_city: None,
            feed: Vec::new(),
            origin: None,
            bookmarks: BookmarkCollection::default(),
            view: Vec::new(),
        }
    }

    /// Restore the persisted city selection. Call once at startup.
    ///
    /// Loads that city's bookmarks; the feed stays empty until a fetch.
    pub async fn startup(&mut self) -> Option<String> {
        let city = self.db.load_selected_city().await?;
        tracing::info!(city = %city, "Restored selected city");
        self.activate(&city).await;
        Some(city)
    }

    pub fn active_city(&self) -> Option<&str> {
        self.active_city.as_deref()
    }

    pub fn view(&self) -> &[FeedEntry] {
        &self.view
    }

    pub fn bookmarks(&self) -> &BookmarkCollection {
        &self.bookmarks
    }

    /// Origin of the current feed, `None` before the first applied fetch.
    pub fn origin(&self) -> Option<&ArticleOrigin> {
        self.origin.as_ref()
    }

    pub fn store(&self) -> &BookmarkStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn activate(&mut self, city: &str) {
        self.active_city = Some(city.to_string());
        self.feed.clear();
        self.origin = None;
        self.bookmarks = self.store.load_or_empty(city).await;
        self.rederive();
    }

    fn rederive(&mut self) {
        self.view = annotate(&self.feed, &self.bookmarks);
    }

    /// Make `city` the active city and persist the selection.
    ///
    /// The in-memory switch happens even if persisting fails; the error is
    /// returned so the caller can tell the user. A blank name is rejected
    /// and leaves the current selection as it was.
    pub async fn select_city(&mut self, city: &str) -> Result<(), ReconcileError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(ReconcileError::BlankCity);
        }
        if self.active_city.as_deref() != Some(city) {
            tracing::info!(
                from = self.active_city.as_deref().unwrap_or("-"),
                to = %city,
                "City changed"
            );
        }
        self.activate(city).await;

        self.db.save_selected_city(city).await.map_err(|e| {
            tracing::warn!(city = %city, error = %e, "Failed to persist selected city");
            ReconcileError::Storage(e)
        })
    }

    /// Capture the active city for a fetch about to start.
    pub fn begin_fetch(&self) -> Option<FetchTicket> {
        self.active_city.as_ref().map(|city| FetchTicket { city: city.clone() })
    }

    /// Apply a fetch result started with `ticket`.
    ///
    /// Returns false, leaving the view untouched, when the active city has
    /// changed since the fetch began.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, outcome: FetchOutcome) -> bool {
        if self.active_city.as_deref() != Some(ticket.city.as_str()) {
            tracing::debug!(
                fetched_for = %ticket.city,
                active = self.active_city.as_deref().unwrap_or("-"),
                "Ignoring stale fetch (city changed)"
            );
            return false;
        }

        tracing::debug!(
            city = %ticket.city,
            count = outcome.articles.len(),
            fallback = outcome.is_fallback(),
            "Feed updated"
        );
        self.feed = outcome.articles;
        self.origin = Some(outcome.origin);
        self.rederive();
        true
    }

    /// Fetch the active city's articles and apply them. Also serves as
    /// pull-to-refresh.
    ///
    /// Returns the origin of the new feed, or `None` if there is no active
    /// city or the result was dropped as stale.
    pub async fn refresh(&mut self) -> Option<ArticleOrigin> {
        let ticket = self.begin_fetch()?;
        let outcome = self.source.fetch_articles(ticket.city()).await;
        let origin = outcome.origin.clone();
        self.apply_fetch(ticket, outcome).then_some(origin)
    }

    /// Toggle the bookmark of the feed article with `url`.
    pub async fn toggle(&mut self, url: &str) -> Result<Notice, ReconcileError> {
        let city = self.active_city.clone().ok_or(ReconcileError::NoActiveCity)?;
        let article = self
            .feed
            .iter()
            .find(|a| a.url == url)
            .cloned()
            .ok_or_else(|| ReconcileError::UnknownArticle(url.to_string()))?;

        let outcome = self.store.toggle(&city, &article).await?;
        self.bookmarks = outcome.collection;
        self.rederive();

        Ok(if outcome.was_added {
            Notice::BookmarkSaved
        } else {
            Notice::BookmarkRemoved
        })
    }

    /// Remove the bookmark with `url` from the active city's collection.
    pub async fn remove_bookmark(&mut self, url: &str) -> Result<Notice, ReconcileError> {
        let city = self.active_city.clone().ok_or(ReconcileError::NoActiveCity)?;
        self.bookmarks = self.store.remove(&city, url).await?;
        self.rederive();
        Ok(Notice::BookmarkRemoved)
    }

    /// Re-read `city`'s bookmarks when its view regains focus, picking up
    /// removals made elsewhere.
    pub async fn on_view_became_active(&mut self, city: &str) -> &BookmarkCollection {
        if self.active_city.as_deref() == Some(city) {
            self.bookmarks = self.store.load_or_empty(city).await;
            self.rederive();
        } else {
            tracing::debug!(city = %city, "View activated for a city that is not active, switching");
            self.activate(city).await;
        }
        &self.bookmarks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::{sample_articles, OfflineSource};
    use crate::storage::BookmarkRecord;
    use proptest::prelude::*;

    async fn reconciler() -> FeedReconciler<OfflineSource> {
        let db = Database::open(":memory:").await.unwrap();
        FeedReconciler::new(db, OfflineSource)
    }

    #[test]
    fn test_annotate_keeps_feed_order_and_skips_foreign_bookmarks() {
        let feed = sample_articles("Paris");
        let other = sample_articles("Tokyo").remove(0);
        let records = vec![
            BookmarkRecord::new(other, "Paris"),
            BookmarkRecord::new(feed[5].clone(), "Paris"),
            BookmarkRecord::new(feed[1].clone(), "Paris"),
        ];
        let bookmarks = BookmarkCollection::from_records("Paris", records);

        let view = annotate(&feed, &bookmarks);

        assert_eq!(view.len(), feed.len());
        for (entry, article) in view.iter().zip(&feed) {
            assert_eq!(entry.article.url, article.url);
        }
        let flagged: Vec<usize> = view
            .iter()
            .enumerate()
            .filter(|(_, e)| e.bookmarked)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, vec![1, 5]);
    }

    #[tokio::test]
    async fn test_toggle_without_city_fails() {
        let mut r = reconciler().await;
        let err = r.toggle("https://example.com/x").await.unwrap_err();
        assert!(matches!(err, ReconcileError::NoActiveCity));
        assert!(r.refresh().await.is_none());
    }

    #[tokio::test]
    async fn test_toggle_unknown_url_fails() {
        let mut r = reconciler().await;
        r.select_city("Paris").await.unwrap();
        r.refresh().await;

        let err = r.toggle("https://example.com/tokyo/article1").await.unwrap_err();
        assert!(matches!(err, ReconcileError::UnknownArticle(_)));
        assert!(err.notice().is_none());
    }

    #[tokio::test]
    async fn test_toggle_updates_view_and_notice() {
        let mut r = reconciler().await;
        r.select_city("Paris").await.unwrap();
        r.refresh().await;
        let url = r.view()[0].article.url.clone();

        assert_eq!(r.toggle(&url).await.unwrap(), Notice::BookmarkSaved);
        assert!(r.view()[0].bookmarked);

        assert_eq!(r.toggle(&url).await.unwrap(), Notice::BookmarkRemoved);
        assert!(!r.view()[0].bookmarked);
    }

    #[tokio::test]
    async fn test_blank_city_is_rejected() {
        let db = Database::open(":memory:").await.unwrap();
        let mut r = FeedReconciler::new(db.clone(), OfflineSource);
        r.select_city("Seoul").await.unwrap();

        for blank in ["", "   ", "\t\n"] {
            let err = r.select_city(blank).await.unwrap_err();
            assert!(matches!(err, ReconcileError::BlankCity));
            assert!(err.notice().is_none());
        }

        assert_eq!(r.active_city(), Some("Seoul"));
        assert_eq!(db.load_selected_city().await.as_deref(), Some("Seoul"));
        assert_eq!(db.get_value("bookmarks_").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_startup_restores_city() {
        let db = Database::open(":memory:").await.unwrap();
        db.save_selected_city("Mumbai").await.unwrap();

        let mut r = FeedReconciler::new(db, OfflineSource);
        assert_eq!(r.startup().await.as_deref(), Some("Mumbai"));
        assert_eq!(r.active_city(), Some("Mumbai"));
        assert!(r.view().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_maps_to_notice() {
        let db = Database::open(":memory:").await.unwrap();
        let mut r = FeedReconciler::new(db.clone(), OfflineSource);
        r.select_city("Paris").await.unwrap();
        r.refresh().await;
        let url = r.view()[2].article.url.clone();

        db.close().await;
        let err = r.toggle(&url).await.unwrap_err();

        assert_eq!(err.notice(), Some(Notice::SaveFailed));
        assert!(!r.view()[2].bookmarked);
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(Notice::BookmarkSaved.to_string(), "Article saved to bookmarks");
        assert_eq!(
            Notice::BookmarkRemoved.to_string(),
            "Article removed from bookmarks"
        );
    }

    proptest! {
        #[test]
        fn prop_flags_match_url_membership(
            picks in proptest::collection::vec(any::<bool>(), 8),
            feed_seed in any::<u64>(),
            bookmark_seed in any::<u64>(),
        ) {
            let mut feed = sample_articles("Berlin");
            let chosen: Vec<Article> = feed
                .iter()
                .zip(&picks)
                .filter(|(_, p)| **p)
                .map(|(a, _)| a.clone())
                .collect();

            let mut records: Vec<BookmarkRecord> = chosen
                .iter()
                .cloned()
                .map(|a| BookmarkRecord::new(a, "Berlin"))
                .collect();
            records.push(BookmarkRecord::new(sample_articles("Seoul").remove(3), "Berlin"));

            // Deterministic shuffles driven by the seeds
            let feed_len = feed.len();
            feed.rotate_left((feed_seed as usize) % feed_len);
            let records_len = records.len();
            records.rotate_right((bookmark_seed as usize) % records_len);
            if feed_seed % 2 == 0 {
                feed.reverse();
            }

            let bookmarks = BookmarkCollection::from_records("Berlin", records);
            let view = annotate(&feed, &bookmarks);

            prop_assert_eq!(view.len(), feed.len());
            for (entry, article) in view.iter().zip(&feed) {
                prop_assert_eq!(&entry.article, article);
                let expected = chosen.iter().any(|c| c.url == article.url);
                prop_assert_eq!(entry.bookmarked, expected);
            }
        }
    }
}
