//! Site assembly: menus, feeds, the render cache and templates.

pub mod cache;
pub mod feed;
pub mod menu;
pub mod render;
pub mod sitemap;
pub mod view;
pub mod watch;

pub use cache::{CacheKey, RenderCache, Rendered};
pub use render::{RenderError, Renderer};
pub use watch::{FileWatcher, RefreshPlan, WatchEvent, WatchPaths};

/// Where the site is being served from, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrl {
    root: String,
    host: String,
}

impl SiteUrl {
    /// Prefer the request's `Host` header, then the configured URL, then localhost.
    pub fn resolve(host_header: Option<&str>, configured: Option<&str>) -> Self {
        if let Some(host) = host_header.map(str::trim).filter(|h| !h.is_empty()) {
            return Self {
                root: format!("http://{host}"),
                host: strip_port(host).to_string(),
            };
        }

        if let Some(url) = configured.map(|u| u.trim().trim_end_matches('/')).filter(|u| !u.is_empty()) {
            let authority = url
                .split_once("://")
                .map_or(url, |(_, rest)| rest)
                .split('/')
                .next()
                .unwrap_or_default();
            return Self {
                root: url.to_string(),
                host: strip_port(authority).to_string(),
            };
        }

        Self {
            root: "http://localhost".to_string(),
            host: "localhost".to_string(),
        }
    }

    /// Scheme and authority, no trailing slash.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Host name without a port.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Absolute URL for a root-relative path.
    pub fn join(&self, abspath: &str) -> String {
        format!("{}/{}", self.root, abspath.trim_start_matches('/'))
    }
}

fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        return authority
            .find(']')
            .map_or(authority, |end| &authority[..=end]);
    }
    authority.split(':').next().unwrap_or(authority)
}
