//! Pages: the rendering view over a document.
//!
//! A page never holds its parent or children. Relations are looked up by
//! path in the catalog the caller passes in, so they always reflect the
//! same scan as the page itself.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDate, Utc};

use super::document::{Document, Format};
use super::markdown::{MarkdownError, first_heading, render_markdown};
use super::paths::{abspath, normalize_path};
use super::store::Catalog;
use crate::config::MarkdownConfig;

pub const DEFAULT_TEMPLATE: &str = "page";
pub const DEFAULT_LAYOUT: &str = "layout";

#[derive(thiserror::Error, Debug)]
pub enum PageError {
    #[error("page '{0}' has no heading")]
    MissingHeading(String),

    #[error("markdown error in '{path}': {source}")]
    Markdown {
        path: String,
        source: MarkdownError,
    },
}

/// A page built from a document.
#[derive(Debug, Clone)]
pub struct Page {
    document: Arc<Document>,
    /// Front matter heading or the first markdown heading, found on first use.
    heading: OnceLock<Option<String>>,
    date: Option<DateTime<Utc>>,
}

impl Page {
    /// Build a page from a document. Pure: nothing is read from disk.
    pub fn from_document(document: Arc<Document>) -> Self {
        let date = document.front_matter.date.as_deref().and_then(|raw| {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                tracing::debug!(path = %document.path, date = raw, "ignoring unparsable date");
            }
            parsed
        });

        Self {
            document,
            heading: OnceLock::new(),
            date,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn path(&self) -> &str {
        &self.document.path
    }

    pub fn abspath(&self) -> String {
        abspath(&self.document.path)
    }

    /// The page heading. Missing headings are a data error.
    pub fn heading(&self) -> Result<&str, PageError> {
        self.heading
            .get_or_init(|| {
                let front_matter = &self.document.front_matter;
                front_matter.heading.clone().or_else(|| match self.document.format {
                    Format::Markdown => first_heading(&self.document.raw_content),
                    Format::Html => None,
                })
            })
            .as_deref()
            .ok_or_else(|| PageError::MissingHeading(self.abspath()))
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    /// Articles are pages with a date. Only articles go in the feed.
    pub fn is_article(&self) -> bool {
        self.date.is_some()
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.document.last_modified
    }

    pub fn template(&self) -> &str {
        self.document
            .front_matter
            .template
            .as_deref()
            .unwrap_or(DEFAULT_TEMPLATE)
    }

    pub fn layout(&self) -> &str {
        self.document
            .front_matter
            .layout
            .as_deref()
            .unwrap_or(DEFAULT_LAYOUT)
    }

    pub fn feed_id(&self) -> Option<&str> {
        self.document.front_matter.feed_id.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.document.front_matter.description.as_deref()
    }

    pub fn keywords(&self) -> Option<&str> {
        self.document.front_matter.keywords.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.document.front_matter.summary.as_deref()
    }

    pub fn read_more(&self) -> &str {
        self.document
            .front_matter
            .read_more
            .as_deref()
            .unwrap_or("Continue reading")
    }

    /// Whether the page may appear in menus (absent flag means yes).
    pub fn in_menu(&self) -> bool {
        self.document.front_matter.menu
    }

    /// Normalized path of the declared parent, if any.
    pub fn parent_path(&self) -> Option<String> {
        declared_parent(&self.document)
    }

    /// The parent page. A parent path that names no document degrades to
    /// no parent.
    pub fn parent(&self, catalog: &Catalog) -> Option<Page> {
        let parent_path = self.parent_path()?;
        match catalog.find(&parent_path) {
            Ok(doc) => Some(Page::from_document(doc)),
            Err(_) => {
                tracing::debug!(path = %self.path(), parent = %parent_path, "parent not found");
                None
            }
        }
    }

    /// Pages naming this page as their parent, in catalog order.
    pub fn children(&self, catalog: &Catalog) -> Vec<Page> {
        children_of(catalog, self.path())
    }

    /// Children eligible for menus.
    pub fn menu_children(&self, catalog: &Catalog) -> Vec<Page> {
        self.children(catalog)
            .into_iter()
            .filter(Page::in_menu)
            .collect()
    }

    /// The page title: `"<heading> - <parent heading>"`, or
    /// `"<heading> - <site title>"` for pages without a parent.
    pub fn heading_with_parent(
        &self,
        catalog: &Catalog,
        site_title: &str,
    ) -> Result<String, PageError> {
        let heading = self.heading()?;
        match self.parent(catalog) {
            Some(parent) => Ok(format!("{} - {}", heading, parent.heading()?)),
            None => Ok(format!("{} - {}", heading, site_title)),
        }
    }

    /// The page body as HTML.
    pub fn body_html(&self, markdown_config: &MarkdownConfig) -> Result<String, PageError> {
        match self.document.format {
            Format::Markdown => render_markdown(&self.document.raw_content, markdown_config)
                .map_err(|source| PageError::Markdown {
                    path: self.abspath(),
                    source,
                }),
            Format::Html => Ok(self.document.raw_content.clone()),
        }
    }
}

/// Pages whose parent is `path`, in catalog order.
///
/// Works whether or not a document exists at `path` itself.
pub fn children_of(catalog: &Catalog, path: &str) -> Vec<Page> {
    let Some(path) = normalize_path(path) else {
        return Vec::new();
    };
    catalog
        .all()
        .filter(|doc| declared_parent(doc).as_deref() == Some(path.as_str()))
        .map(|doc| Page::from_document(Arc::clone(doc)))
        .collect()
}

/// A document's front matter parent, normalized. A page is never its own parent.
fn declared_parent(document: &Document) -> Option<String> {
    let parent = normalize_path(document.front_matter.parent.as_deref()?)?;
    (parent != document.path).then_some(parent)
}

/// Parse a front matter date.
///
/// Accepts `2024-01-31`, RFC 3339 (`2024-01-31T09:30:00Z`) and
/// `31 January 2024`. Dates without a time are midnight UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%d %B %Y", "%B %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}
