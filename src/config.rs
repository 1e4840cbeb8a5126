//! Configuration file parser for ~/.config/cosmic/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;
use crate::controller::Settings;

/// Environment variable that overrides the config file's `base_url`.
pub const API_BASE_ENV: &str = "COSMIC_API_BASE";

/// The backend caps `limit` at 100.
const PAGE_SIZE_RANGE: std::ops::RangeInclusive<usize> = 1..=100;
const TOP_TAGS_RANGE: std::ops::RangeInclusive<usize> = 1..=50;

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
// Configuration
// ============================================================================

/// Top-level client configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API base URL. Overridden by `COSMIC_API_BASE` and `--base-url`.
    pub base_url: Option<String>,

    /// Posts requested per page.
    pub page_size: usize,

    /// Entries shown in the top tags view.
    pub top_tags_limit: usize,

    /// Whether opening a post counts a view.
    pub increment_views_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            page_size: 10,
            top_tags_limit: 10,
            increment_views_on_open: true,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = [
        "base_url",
        "page_size",
        "top_tags_limit",
        "increment_views_on_open",
    ];

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

        Self::parse(&content)
    }

    /// Parse TOML text. Blank text yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            base_url = ?config.base_url,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Pick the base URL: CLI flag, then environment, then file, then default.
    ///
    /// Blank values at any level are skipped.
    pub fn resolve_base_url(&self, cli: Option<&str>, env: Option<&str>) -> String {
        [cli, env, self.base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    /// Controller tunables, clamped to what the backend accepts.
    pub fn settings(&self) -> Settings {
        let page_size = clamp_logged("page_size", self.page_size, &PAGE_SIZE_RANGE);
        let top_tags_limit = clamp_logged("top_tags_limit", self.top_tags_limit, &TOP_TAGS_RANGE);
        Settings {
            page_size,
            top_tags_limit,
            increment_views_on_open: self.increment_views_on_open,
        }
    }
}

fn clamp_logged(key: &str, value: usize, range: &std::ops::RangeInclusive<usize>) -> usize {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        tracing::warn!(key, value, clamped, "Config value out of range, clamping");
    }
    clamped
}

// ============================================================================
// Tests
// ============================================================================
