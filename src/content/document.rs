use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Formats
// =============================================================================

/// The markup a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Rendered to HTML with pulldown-cmark
    Markdown,
    /// Passed through untouched
    Html,
}

impl Format {
    /// Pick the format for a file from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "md" | "markdown" | "mdown" => Some(Format::Markdown),
            "html" | "htm" => Some(Format::Html),
            _ => None,
        }
    }
}

// =============================================================================
// Documents
// =============================================================================

/// A content document discovered in the content directory.
///
/// Documents are immutable once loaded. A refresh of the store replaces
/// them wholesale rather than mutating them in place.
#[derive(Debug, Clone)]
pub struct Document {
    /// Normalized path (e.g., "blog/post-1", "" for the root index)
    pub path: String,
    /// Path relative to the content root (e.g., "blog/post-1.md")
    pub source_path: PathBuf,
    pub format: Format,
    /// The markup without the front matter block
    pub raw_content: String,
    /// Modification time from the file's metadata
    pub last_modified: DateTime<Utc>,
    pub front_matter: FrontMatter,
}

/// Front matter metadata parsed from the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Page heading; falls back to the first `#` heading of Markdown content
    #[serde(alias = "title")]
    pub heading: Option<String>,
    /// Publication date. Pages with a date are articles.
    pub date: Option<String>,
    /// Template used to render the page body
    pub template: Option<String>,
    /// Layout wrapping the rendered template
    pub layout: Option<String>,
    /// Explicit Atom entry id
    #[serde(alias = "atom_id")]
    pub feed_id: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    /// Path of the parent page
    pub parent: Option<String>,
    /// Set to `false` to keep the page out of menus
    #[serde(default = "default_menu")]
    pub menu: bool,
    /// Short summary shown in article listings and the feed
    pub summary: Option<String>,
    /// Link text for "read more" links in listings
    pub read_more: Option<String>,
    /// Additional arbitrary metadata (available in templates as `page.*`)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

fn default_menu() -> bool {
    true
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            heading: None,
            date: None,
            template: None,
            layout: None,
            feed_id: None,
            description: None,
            keywords: None,
            parent: None,
            menu: default_menu(),
            summary: None,
            read_more: None,
            extra: HashMap::new(),
        }
    }
}

/// Result of parsing front matter from document content.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The content without the front matter block
    pub content: String,
}

/// Parse front matter from document content.
///
/// Front matter is a YAML block delimited by `---` at the start of the file:
///
/// ```markdown
/// ---
/// heading: My Page
/// date: 2024-01-01
/// parent: blog
/// ---
///
/// Content starts here
/// ```
///
/// Returns the parsed front matter and the remaining content.
pub fn parse_front_matter(content: &str) -> ParsedContent {
    let content = content.trim_start();

    if !content.starts_with("---") {
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    }

    let after_opening = &content[3..];
    let Some(closing_pos) = after_opening.find("\n---") else {
        // No closing delimiter, treat entire content as markup
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    };

    let yaml_content = after_opening[..closing_pos].trim_start_matches('\n');

    // "---" + yaml + "\n---"
    let body_start = 3 + closing_pos + 4;
    let body = if body_start < content.len() {
        content[body_start..].trim_start_matches('\n').to_string()
    } else {
        String::new()
    };

    let front_matter = if yaml_content.trim().is_empty() {
        FrontMatter::default()
    } else {
        match serde_yaml::from_str(yaml_content) {
            Ok(fm) => fm,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse front matter");
                FrontMatter::default()
            }
        }
    };

    ParsedContent {
        front_matter,
        content: body,
    }
}

impl Document {
    /// Build a document from the text of a file.
    pub fn from_source(
        path: String,
        source_path: PathBuf,
        format: Format,
        text: &str,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let parsed = parse_front_matter(text);
        Self {
            path,
            source_path,
            format,
            raw_content: parsed.content,
            last_modified,
            front_matter: parsed.front_matter,
        }
    }
}
