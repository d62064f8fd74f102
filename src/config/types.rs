//! Configuration type definitions.
//!
//! This module contains the data structures read from `folio.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// =============================================================================
// Site configuration
// =============================================================================

/// Top-level site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title, used in page titles and the feed
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub author: Option<AuthorConfig>,
    #[serde(default)]
    pub google_analytics_code: Option<String>,
    /// Canonical base URL, used when a request carries no `Host` header
    #[serde(default)]
    pub url: Option<String>,
    /// Serve previously rendered responses from memory
    #[serde(default)]
    pub cache: bool,
    /// Directory holding page documents
    #[serde(default = "default_content_path")]
    pub content_path: PathBuf,
    /// Directory holding attachments served under `/attachments`
    #[serde(default = "default_attachment_path")]
    pub attachment_path: PathBuf,
    /// Directory holding the theme (`templates/**`)
    #[serde(default = "default_theme_path")]
    pub theme_path: PathBuf,
    #[serde(default)]
    pub environment: Environment,
    /// Number of levels shown in the navigation menu
    #[serde(default = "default_menu_depth")]
    pub menu_depth: usize,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    /// Arbitrary settings passed to templates as `theme.*`
    #[serde(default)]
    pub theme: serde_json::Value,
    #[serde(default)]
    pub dev: DevConfig,
}

fn default_content_path() -> PathBuf {
    PathBuf::from("content/pages")
}

fn default_attachment_path() -> PathBuf {
    PathBuf::from("content/attachments")
}

fn default_theme_path() -> PathBuf {
    PathBuf::from("theme")
}

fn default_menu_depth() -> usize {
    crate::site::menu::DEFAULT_MENU_DEPTH
}

impl SiteConfig {
    /// A configuration with every optional field at its default.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            description: None,
            keywords: None,
            author: None,
            google_analytics_code: None,
            url: None,
            cache: false,
            content_path: default_content_path(),
            attachment_path: default_attachment_path(),
            theme_path: default_theme_path(),
            environment: Environment::default(),
            menu_depth: default_menu_depth(),
            markdown: MarkdownConfig::default(),
            theme: serde_json::Value::Null,
            dev: DevConfig::default(),
        }
    }

    /// Resolve every relative path against `base_path` (the config file's directory).
    pub fn resolve_paths(&mut self, base_path: &Path) {
        for path in [
            &mut self.content_path,
            &mut self.attachment_path,
            &mut self.theme_path,
        ] {
            if path.is_relative() {
                *path = base_path.join(&*path);
            }
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

/// Feed author details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorConfig {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub email: Option<String>,
}

/// The environment the server runs in.
///
/// Development surfaces render errors directly instead of through the
/// error template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Development configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevConfig {
    /// File watching configuration
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration for file watching while serving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Use polling-based watcher instead of native file system events.
    /// Useful for network filesystems, Docker volumes, or other situations
    /// where native events are unreliable.
    #[serde(default)]
    pub poll: bool,
    /// Poll interval in milliseconds (only used if poll=true).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Debounce timeout in milliseconds.
    /// Changes within this window are batched together.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
