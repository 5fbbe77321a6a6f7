//! Configuration file parser for ~/.config/citypulse/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `news_api_key`.
pub const API_KEY_ENV: &str = "NEWS_API_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `Debug` masks `news_api_key`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// News search API key (alternative to the NEWS_API_KEY env var).
    pub news_api_key: Option<String>,

    /// Base URL of the news search API; `/everything` is appended.
    pub news_base_url: String,

    /// Language filter sent with every lookup.
    pub language: String,

    /// Number of articles requested per lookup.
    pub page_size: u32,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// City used when none was selected yet.
    pub default_city: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            news_api_key: None,
            news_base_url: "https://newsapi.org/v2".to_string(),
            language: "en".to_string(),
            page_size: 10,
            request_timeout_secs: 15,
            default_city: "New York".to_string(),
        }
    }
}

/// On-disk layout: known keys land in `config`, everything else in `unknown`.
#[derive(Deserialize)]
struct ConfigFile {
    #[serde(flatten)]
    config: Config,
    #[serde(flatten)]
    unknown: toml::Table,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "news_api_key",
                &self.news_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("news_base_url", &self.news_base_url)
            .field("language", &self.language)
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("default_city", &self.default_city)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let (config, unknown) = Self::parse(&content)?;
        for key in unknown {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
        }
        tracing::info!(
            path = %path.display(),
            base_url = %config.news_base_url,
            default_city = %config.default_city,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse TOML content, returning the config and the top-level keys it
    /// does not recognize.
    fn parse(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok((file.config, file.unknown.into_iter().map(|(k, _)| k).collect()))
    }

    /// API key from `NEWS_API_KEY`, falling back to the config file.
    ///
    /// Blank values count as unset.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        Self::pick_api_key(from_env, self.news_api_key.clone())
    }

    fn pick_api_key(from_env: Option<String>, from_file: Option<String>) -> Option<SecretString> {
        from_env
            .filter(|k| !k.trim().is_empty())
            .or_else(|| from_file.filter(|k| !k.trim().is_empty()))
            .map(SecretString::from)
    }
}

// ============================================================================
// Tests
// ============================================================================
