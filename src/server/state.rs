//! Shared application state.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use crate::config::SiteConfig;
use crate::content::DocumentStore;
use crate::site::{RefreshPlan, RenderCache, RenderError, Renderer};

/// State shared by every request.
///
/// The document store and renderer can be swapped out from under running
/// requests by the file watcher; each request works from the snapshot it
/// took at the start.
pub struct AppState {
    pub config: SiteConfig,
    pub store: DocumentStore,
    pub cache: RenderCache,
    renderer: RwLock<Renderer>,
}

impl AppState {
    pub fn new(config: SiteConfig, store: DocumentStore, renderer: Renderer) -> Self {
        let cache = RenderCache::new(config.cache);
        Self {
            config,
            store,
            cache,
            renderer: RwLock::new(renderer),
        }
    }

    pub fn renderer(&self) -> RwLockReadGuard<'_, Renderer> {
        self.renderer.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }

    /// Apply a batch of file changes: re-scan content, reload templates,
    /// and flush the render cache when rendered output may be stale.
    ///
    /// A failed re-scan or reload keeps the previous state and is logged.
    pub fn refresh(&self, plan: RefreshPlan) {
        if plan.rescan
            && let Err(e) = self.store.refresh()
        {
            tracing::error!(error = %e, "failed to refresh content");
        }

        if plan.reload_templates
            && let Err(e) = self.reload_templates()
        {
            tracing::error!(error = %e, "failed to reload templates");
        }

        if plan.config_changed {
            tracing::warn!("configuration changed, restart to apply it");
        }

        if plan.flushes_cache() {
            self.cache.flush();
        }
    }

    fn reload_templates(&self) -> Result<(), RenderError> {
        self.renderer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reload()
    }
}
