//! Route handlers.
//!
//! Each handler resolves the request against a snapshot of the document
//! store and renders through the shared render cache. Failures are turned
//! into error pages by [`SiteError::into_site_response`].

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::error::SiteError;
use super::state::AppState;
use crate::content::page::DEFAULT_LAYOUT;
use crate::content::paths::normalize_path;
use crate::content::{Page, mime_from_path};
use crate::site::feed::{ATOM_CONTENT_TYPE, build_feed};
use crate::site::render::HOME_TEMPLATE;
use crate::site::sitemap::{SITEMAP_CONTENT_TYPE, build_sitemap};
use crate::site::view::{CommonView, HomeView, PageView};
use crate::site::{CacheKey, Rendered, SiteUrl};

pub const HTML: &str = "text/html; charset=utf-8";
pub const CSS: &str = "text/css; charset=utf-8";

fn site_url(state: &AppState, headers: &HeaderMap) -> SiteUrl {
    let host = headers.get(HOST).and_then(|h| h.to_str().ok());
    SiteUrl::resolve(host, state.config.url.as_deref())
}

fn respond(
    state: &AppState,
    url: &SiteUrl,
    path: &str,
    result: Result<Rendered, SiteError>,
) -> Response {
    match result {
        Ok(rendered) => (
            StatusCode::OK,
            [(CONTENT_TYPE, rendered.content_type)],
            rendered.body,
        )
            .into_response(),
        Err(e) => e.into_site_response(state, url, path),
    }
}

/// `GET /`
pub async fn home(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let url = site_url(&state, &headers);
    let result = state
        .cache
        .with_cache(CacheKey::page(url.root(), "", HTML), || render_home(&state, &url));
    respond(&state, &url, "/", result)
}

fn render_home(state: &AppState, url: &SiteUrl) -> Result<Rendered, SiteError> {
    let catalog = state.store.catalog();
    let view = HomeView::build(&catalog, &state.config, url)?;
    let body = state
        .renderer()
        .render_page(HOME_TEMPLATE, DEFAULT_LAYOUT, &view)?;
    Ok(Rendered::new(body, HTML))
}

/// `GET /css/{sheet}.css`
pub async fn stylesheet(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Response {
    let url = site_url(&state, &headers);
    let request_path = format!("/css/{file}");
    let result = match file.strip_suffix(".css") {
        Some(sheet) if !sheet.is_empty() => state
            .cache
            .with_cache(CacheKey::stylesheet(url.root(), sheet), || {
                let view = CommonView::bare(&state.config, &url);
                let body = state.renderer().render_stylesheet(sheet, &view)?;
                Ok::<_, SiteError>(Rendered::new(body, CSS))
            }),
        _ => Err(SiteError::NotFound(request_path.clone())),
    };
    respond(&state, &url, &request_path, result)
}

/// `GET /attachments/{*path}`
pub async fn attachment(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let request_path = format!("/attachments/{path}");
    let result = match state.store.attachment(&path) {
        Ok(file) => tokio::fs::read(&file)
            .await
            .map(|bytes| ([(CONTENT_TYPE, mime_from_path(&file))], bytes).into_response())
            .map_err(|source| SiteError::Attachment {
                path: path.clone(),
                source,
            }),
        Err(e) => Err(SiteError::from(e)),
    };
    result.unwrap_or_else(|e| {
        let url = site_url(&state, &headers);
        e.into_site_response(&state, &url, &request_path)
    })
}

/// `GET /articles.xml`
pub async fn articles_feed(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let url = site_url(&state, &headers);
    let result = state
        .cache
        .with_cache(CacheKey::page(url.root(), "articles.xml", ATOM_CONTENT_TYPE), || {
            let catalog = state.store.catalog();
            let body = build_feed(&catalog, &state.config, &url)?;
            Ok::<_, SiteError>(Rendered::new(body, ATOM_CONTENT_TYPE))
        });
    respond(&state, &url, "/articles.xml", result)
}

/// `GET /sitemap.xml`
pub async fn sitemap(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let url = site_url(&state, &headers);
    let result = state
        .cache
        .with_cache(CacheKey::page(url.root(), "sitemap.xml", SITEMAP_CONTENT_TYPE), || {
            let catalog = state.store.catalog();
            Ok::<_, SiteError>(Rendered::new(
                build_sitemap(&catalog, &url),
                SITEMAP_CONTENT_TYPE,
            ))
        });
    respond(&state, &url, "/sitemap.xml", result)
}

/// `GET /{*path}`: any other path names a page.
pub async fn page(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let url = site_url(&state, &headers);
    let request_path = format!("/{path}");
    let result = match normalize_path(&path) {
        // The root document is served by the home route
        Some(path) if !path.is_empty() => state
            .cache
            .with_cache(CacheKey::page(url.root(), path.clone(), HTML), || {
                render_page(&state, &url, &path)
            }),
        _ => Err(SiteError::NotFound(request_path.clone())),
    };
    respond(&state, &url, &request_path, result)
}

fn render_page(state: &AppState, url: &SiteUrl, path: &str) -> Result<Rendered, SiteError> {
    let catalog = state.store.catalog();
    let page = Page::from_document(catalog.find(path)?);
    tracing::debug!(path, template = page.template(), "rendering page");

    let view = PageView::build(&page, &catalog, &state.config, url)?;
    let body = state
        .renderer()
        .render_page(page.template(), page.layout(), &view)?;
    Ok(Rendered::new(body, HTML))
}
