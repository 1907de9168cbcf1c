//! Static file fallback with single-page-app rewriting.
//!
//! # Responsibilities
//! - Serve files under the root folder for unrouted requests
//! - In SPA mode, send client-side routes to the index page
//!
//! # Design Decisions
//! - `/app/` and `/assets/` are always served literally
//! - Known asset extensions are served literally, query string or not
//! - Everything else in SPA mode becomes `/`

use axum::{
    body::Body,
    http::{Request, Uri},
    response::{IntoResponse, Response},
};
use regex::Regex;
use std::convert::Infallible;
use std::path::Path;
use std::sync::LazyLock;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Prefixes never rewritten in SPA mode.
pub const RESERVED_PREFIXES: [&str; 2] = ["/app/", "/assets/"];

static ASSET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(ttf|eot|svg|js|woff2|map|ico)(\?.*)?$").expect("asset pattern is valid")
});

/// Whether SPA mode sends this request to the index page.
pub fn needs_index_rewrite(uri: &Uri) -> bool {
    let path = uri.path();
    if RESERVED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return false;
    }
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or(path);
    !ASSET_PATTERN.is_match(target)
}

/// File server rooted at the configured folder.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    serve_dir: ServeDir,
    spa_mode: bool,
}

impl StaticFiles {
    pub fn new(root: impl AsRef<Path>, spa_mode: bool) -> Self {
        Self {
            serve_dir: ServeDir::new(root),
            spa_mode,
        }
    }

    /// Serve a request from disk, applying the SPA rewrite when enabled.
    pub async fn serve(&self, mut request: Request<Body>) -> Response {
        if self.spa_mode && needs_index_rewrite(request.uri()) {
            tracing::trace!(path = %request.uri().path(), "SPA rewrite to index");
            *request.uri_mut() = Uri::from_static("/");
        }

        let result: Result<_, Infallible> = self.serve_dir.clone().oneshot(request).await;
        match result {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrites(uri: &str) -> bool {
        needs_index_rewrite(&uri.parse::<Uri>().unwrap())
    }

    #[test]
    fn test_client_routes_rewritten() {
        assert!(rewrites("/dashboard"));
        assert!(rewrites("/users/42/edit"));
        assert!(rewrites("/styles.css"));
        assert!(rewrites("/"));
    }

    #[test]
    fn test_reserved_prefixes_literal() {
        assert!(!rewrites("/assets/app.js"));
        assert!(!rewrites("/app/main.js"));
        assert!(!rewrites("/assets/images/photo.png"));
    }

    #[test]
    fn test_asset_extensions_literal() {
        assert!(!rewrites("/logo.svg"));
        assert!(!rewrites("/favicon.ico"));
        assert!(!rewrites("/fonts/icons.woff2"));
        assert!(!rewrites("/bundle.js.map"));
        assert!(!rewrites("/bundle.js?v=123"));
    }
}
