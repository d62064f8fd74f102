//! Request errors and the pages that report them.

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use super::handlers::HTML;
use super::state::AppState;
use crate::content::page::DEFAULT_LAYOUT;
use crate::content::{PageError, StoreError};
use crate::site::render::{ERROR_TEMPLATE, NOT_FOUND_TEMPLATE};
use crate::site::view::{CommonView, ErrorView};
use crate::site::{RenderError, SiteUrl};

#[derive(thiserror::Error, Debug)]
pub enum SiteError {
    /// No page, attachment or stylesheet at the path.
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Store(StoreError),

    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: String,
        source: std::io::Error,
    },
}

impl From<StoreError> for SiteError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(path) => SiteError::NotFound(path),
            other => SiteError::Store(other),
        }
    }
}

impl From<PageError> for SiteError {
    fn from(e: PageError) -> Self {
        SiteError::Render(RenderError::Page(e))
    }
}

impl SiteError {
    pub fn status(&self) -> StatusCode {
        match self {
            SiteError::NotFound(_) => StatusCode::NOT_FOUND,
            SiteError::Render(RenderError::StylesheetNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turn the error into a response for the request at `path`.
    ///
    /// Missing resources get the not-found template. Other failures get the
    /// error template, or the raw error chain in development. When the
    /// template itself fails, a plain-text body is sent with the same status.
    pub fn into_site_response(self, state: &AppState, url: &SiteUrl, path: &str) -> Response {
        let status = self.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(path, error = %self, "not found");
            return error_page(state, url, path, status, NOT_FOUND_TEMPLATE)
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "failed to render not-found page");
                    plain_text(status, "Not found".to_string())
                });
        }

        let chain = format!("{:#}", anyhow::Error::new(self));
        tracing::error!(path, error = %chain, "request failed");

        if state.is_development() {
            return plain_text(status, chain);
        }

        error_page(state, url, path, status, ERROR_TEMPLATE).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to render error page");
            plain_text(status, "Internal server error".to_string())
        })
    }
}

fn error_page(
    state: &AppState,
    url: &SiteUrl,
    path: &str,
    status: StatusCode,
    template: &str,
) -> Result<Response, RenderError> {
    let catalog = state.store.catalog();
    // A broken menu must not stop the error page itself from rendering
    let common = CommonView::with_menu(&catalog, &state.config, url)
        .unwrap_or_else(|_| CommonView::bare(&state.config, url));
    let view = ErrorView::new(common, status.as_u16(), path);
    let body = state.renderer().render_page(template, DEFAULT_LAYOUT, &view)?;
    Ok((status, [(CONTENT_TYPE, HTML)], body).into_response())
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (status, [(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SiteError::from(StoreError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SiteError::from(RenderError::StylesheetNotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SiteError::from(PageError::MissingHeading("/x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SiteError::from(RenderError::TemplateNotFound("x.html".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
