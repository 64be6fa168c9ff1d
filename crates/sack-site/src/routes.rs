//! HTTP routes of the showcase site.
//!
//! | Route          | Served from                                   |
//! |----------------|-----------------------------------------------|
//! | `/`            | `layout.index_page`                           |
//! | `/story`       | `layout.story_page`                           |
//! | `/model{N}`    | `layout.page_file(N)` for each configured `N` |
//! | `/static/*`    | files under `layout.static_dir`               |
//! | `/config.yaml` | `layout.config_path`                          |
//! | `/graph.json`  | `layout.story_graph_path`                     |
//! | anything else  | `layout.not_found_page` with status 404       |
//!
//! Pages are read from disk on every request, so regenerated files are
//! picked up without restarting. When a page cannot be read the server
//! answers with `layout.server_error_page`, or a plain-text body if that is
//! missing too. A missing `/model{N}` page is a 404 instead, since it only
//! means the page has not been rendered yet.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use camino::{Utf8Path, Utf8PathBuf};
use sack_core::{SiteConfig, SiteLayout, sorted_page_keys};
use tower_http::services::{ServeDir, ServeFile};

use crate::error::SiteError;

/// Body used when even the error page cannot be read.
const PLAIN_SERVER_ERROR: &str = "Internal Server Error";

/// Shared state of the page handlers.
#[derive(Debug, Clone)]
pub struct SiteState {
    layout: Arc<SiteLayout>,
}

impl SiteState {
    /// Creates handler state for `layout`.
    #[must_use]
    pub fn new(layout: SiteLayout) -> Self {
        Self {
            layout: Arc::new(layout),
        }
    }

    /// Returns the site layout.
    #[must_use]
    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }
}

/// Builds the site router for the pages in `config`.
///
/// One `/model{N}` route is added per distinct page number; a second key with
/// the same number is logged and skipped.
///
/// # Errors
///
/// Returns [`SiteError::Config`] if a page key has no number.
pub fn site_router(config: &SiteConfig, layout: &SiteLayout) -> Result<Router, SiteError> {
    let state = SiteState::new(layout.clone());

    let mut router = Router::new()
        .route("/", get(home))
        .route("/story", get(story))
        .route_service("/config.yaml", ServeFile::new(&layout.config_path))
        .route_service("/graph.json", ServeFile::new(&layout.story_graph_path))
        .nest_service("/static", ServeDir::new(&layout.static_dir));

    let mut seen = BTreeSet::new();
    for (number, key) in sorted_page_keys(&config.pages)? {
        if !seen.insert(number) {
            tracing::warn!(page = key, number, "Duplicate page number, route already registered");
            continue;
        }
        let file = layout.page_file(number);
        router = router.route(
            &format!("/model{number}"),
            get(move |State(state): State<SiteState>| {
                let file = file.clone();
                async move { serve_page(&state, &file).await }
            }),
        );
    }

    tracing::debug!(pages = seen.len(), "Site routes registered");
    Ok(router.fallback(fallback).with_state(state))
}

async fn home(State(state): State<SiteState>) -> Response {
    serve_fixed_page(&state, &state.layout.index_page).await
}

async fn story(State(state): State<SiteState>) -> Response {
    serve_fixed_page(&state, &state.layout.story_page).await
}

/// Serves a page that must exist; any read failure is a 500.
async fn serve_fixed_page(state: &SiteState, file: &Utf8Path) -> Response {
    match read_page(file).await {
        Ok(body) => Html(body).into_response(),
        Err(err) => server_error(state, &err).await,
    }
}

async fn fallback(State(state): State<SiteState>) -> Response {
    not_found(&state).await
}

async fn serve_page(state: &SiteState, file: &Utf8Path) -> Response {
    match read_page(file).await {
        Ok(body) => Html(body).into_response(),
        Err(err) if err.is_not_found() => not_found(state).await,
        Err(err) => server_error(state, &err).await,
    }
}

/// Answers with the 404 page.
pub async fn not_found(state: &SiteState) -> Response {
    match read_page(&state.layout.not_found_page).await {
        Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Err(err) => server_error(state, &err).await,
    }
}

/// Logs `err` and answers with the 500 page.
pub async fn server_error(state: &SiteState, err: &(dyn Display + Sync)) -> Response {
    tracing::error!(error = %err, "Request failed");
    match read_page(&state.layout.server_error_page).await {
        Ok(body) => (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response(),
        Err(page_err) => {
            tracing::debug!(error = %page_err, "Error page unavailable, using plain text");
            (StatusCode::INTERNAL_SERVER_ERROR, PLAIN_SERVER_ERROR).into_response()
        }
    }
}

async fn read_page(path: &Utf8Path) -> Result<String, SiteError> {
    let path: Utf8PathBuf = path.to_owned();
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| SiteError::template(path, source))
}
