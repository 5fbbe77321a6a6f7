//! City news client core.
//!
//! - [`news`] fetches articles for a city, falling back to sample data
//! - [`storage`] persists the selected city and per-city bookmarks in SQLite
//! - [`feed`] reconciles the fetched feed with the active city's bookmarks

pub mod catalog;
pub mod config;
pub mod feed;
pub mod news;
pub mod storage;
pub mod util;
