//! In-memory render cache.
//!
//! Wraps expensive renders (templates, stylesheets, feeds) so a response
//! computed once is served again without re-rendering. Entries live until
//! the process exits or [`RenderCache::flush`] is called; nothing checks
//! them against the document store. Content refreshes must flush.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

// =============================================================================
// Keys and entries
// =============================================================================

/// Identity of a cached response.
///
/// Every key carries the site root the response was rendered for, since
/// links and feed ids embed it. Pages are keyed by normalized path and
/// content type; query strings are not part of the key. Stylesheets live in
/// their own key space, keyed by sheet name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Page {
        site: String,
        path: String,
        content_type: &'static str,
    },
    Stylesheet {
        site: String,
        sheet: String,
    },
}

impl CacheKey {
    pub fn page(site: &str, path: impl Into<String>, content_type: &'static str) -> Self {
        CacheKey::Page {
            site: site.to_string(),
            path: path.into(),
            content_type,
        }
    }

    pub fn stylesheet(site: &str, sheet: impl Into<String>) -> Self {
        CacheKey::Stylesheet {
            site: site.to_string(),
            sheet: sheet.into(),
        }
    }
}

/// A fully rendered response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub body: String,
    pub content_type: &'static str,
}

impl Rendered {
    pub fn new(body: impl Into<String>, content_type: &'static str) -> Self {
        Self {
            body: body.into(),
            content_type,
        }
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Process-wide render cache, shared between requests.
///
/// Concurrent misses on the same key may render more than once; the last
/// store wins. Failed renders are never stored.
#[derive(Debug, Default)]
pub struct RenderCache {
    enabled: bool,
    entries: RwLock<HashMap<CacheKey, Rendered>>,
}

impl RenderCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Serve `key` from the cache, or run `render` and remember its output.
    ///
    /// When the cache is disabled `render` runs every time and nothing is stored.
    pub fn with_cache<E>(
        &self,
        key: CacheKey,
        render: impl FnOnce() -> Result<Rendered, E>,
    ) -> Result<Rendered, E> {
        if !self.enabled {
            return render();
        }

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            tracing::debug!(?key, "render cache hit");
            return Ok(hit.clone());
        }

        tracing::debug!(?key, "render cache miss");
        let rendered = render()?;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, rendered.clone());
        Ok(rendered)
    }

    /// Drop every entry. Call after content or templates change.
    pub fn flush(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let count = entries.len();
        entries.clear();
        if count > 0 {
            tracing::info!(entries = count, "flushed render cache");
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
