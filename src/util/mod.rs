//! Utility functions for common operations.
//!
//! - **URL validation**: only plain http(s) article links reach the browser
//! - **Text processing**: terminal-safe text, width-aware truncation, age labels
//!
//! # Examples
//!
//! ```
//! use citypulse::util::{display_width, truncate_to_width, validate_url_for_open};
//!
//! let url = validate_url_for_open("https://example.com/paris/article1").unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//!
//! assert_eq!(display_width("Hello"), 5);
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! ```

mod text;
mod url_validator;

pub use text::{display_width, relative_time, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_url_for_open, UrlValidationError};
