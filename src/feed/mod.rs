//! Feed reconciliation for the active city.
//!
//! [`FeedReconciler`] owns the active city, the last fetched article list and
//! that city's bookmarks, and derives the `(article, bookmarked)` view from
//! them. Fetches go through a [`FetchTicket`] so results for a city the user
//! has already left are dropped instead of applied.
//!
//! # Example
//!
//! ```ignore
//! let mut reconciler = FeedReconciler::new(db, news_client);
//! if reconciler.startup().await.is_none() {
//!     reconciler.select_city("Paris").await?;
//! }
//! reconciler.refresh().await;
//! let url = reconciler.view()[2].article.url.clone();
//! let notice = reconciler.toggle(&url).await?;
//! ```

mod reconciler;

pub use reconciler::{annotate, FeedEntry, FeedReconciler, FetchTicket, Notice, ReconcileError};
