use thiserror::Error;
use url::Url;

/// Errors that can occur when validating an article url.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host to visit.
    #[error("URL has no host")]
    MissingHost,
}

/// Validate an article url before handing it to the system browser.
///
/// Article urls come from a remote API, so anything other than a plain
/// http(s) link with a host (`file://`, `javascript:`, custom app schemes)
/// is rejected.
///
/// ```
/// use citypulse::util::validate_url_for_open;
///
/// assert!(validate_url_for_open("https://example.com/paris/article1").is_ok());
/// assert!(validate_url_for_open("file:///etc/passwd").is_err());
/// ```
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}
