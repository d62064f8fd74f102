//! Configuration loading and types for folio.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

pub use load::DEFAULT_CONFIG_FILE;
pub use types::{AuthorConfig, Environment, MarkdownConfig, SiteConfig, WatchConfig};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),
}
