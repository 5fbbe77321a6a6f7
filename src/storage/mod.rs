mod bookmarks;
mod city;
mod kv;
mod schema;
mod types;

pub use bookmarks::{bookmark_key, BookmarkStore, ToggleOutcome, BOOKMARK_KEY_PREFIX};
pub use city::SELECTED_CITY_KEY;
pub use schema::Database;
pub use types::{BookmarkCollection, BookmarkRecord, StorageError};
