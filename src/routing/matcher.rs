//! Prefix matching and upstream URI rewriting.
//!
//! # Responsibilities
//! - Match request path against a route prefix (case-sensitive)
//! - Strip/prepend path segments per route mapping
//! - Build the absolute upstream URI
//!
//! # Design Decisions
//! - Plain `starts_with`, no regex in the hot path
//! - Query string is carried over untouched
//! - A rewritten path always begins with `/`

use axum::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use std::str::FromStr;

use crate::config::RouteMapping;
use crate::routing::RouteError;

/// Returns true if `path` falls under the mapping's prefix.
pub fn matches(mapping: &RouteMapping, path: &str) -> bool {
    path.starts_with(&mapping.path)
}

/// Path forwarded upstream for a request path the mapping matched.
pub fn rewrite_path(mapping: &RouteMapping, path: &str) -> String {
    let stripped = if mapping.strip_prefix {
        path.strip_prefix(mapping.path.as_str()).unwrap_or(path)
    } else {
        path
    };

    let mut rewritten = String::with_capacity(mapping.prefix_path.len() + stripped.len() + 1);
    rewritten.push_str(&mapping.prefix_path);
    rewritten.push_str(stripped);

    if !rewritten.starts_with('/') {
        rewritten.insert(0, '/');
    }
    rewritten
}

/// Absolute URI for the upstream request.
pub fn upstream_uri(mapping: &RouteMapping, uri: &Uri) -> Result<Uri, RouteError> {
    let mut path_and_query = rewrite_path(mapping, uri.path());
    if let Some(query) = uri.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    let invalid = |reason: String| RouteError::InvalidTarget {
        target: format!("{}://{}{}", mapping.scheme, mapping.host, path_and_query),
        reason,
    };

    let scheme = Scheme::from_str(&mapping.scheme).map_err(|e| invalid(e.to_string()))?;
    let authority = Authority::from_str(&mapping.host).map_err(|e| invalid(e.to_string()))?;
    let path_and_query =
        PathAndQuery::from_str(&path_and_query).map_err(|e| invalid(e.to_string()))?;

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(path: &str, strip: bool, prefix: &str) -> RouteMapping {
        RouteMapping {
            path: path.into(),
            scheme: "http".into(),
            host: "backend:9000".into(),
            strip_prefix: strip,
            prefix_path: prefix.into(),
        }
    }

    #[test]
    fn test_strip_and_prefix() {
        let m = mapping("/api/", true, "/v1");
        let uri: Uri = "/api/foo".parse().unwrap();
        assert_eq!(
            upstream_uri(&m, &uri).unwrap().to_string(),
            "http://backend:9000/v1foo"
        );
    }

    #[test]
    fn test_no_rewrite_keeps_path() {
        let m = mapping("/api/", false, "");
        assert_eq!(rewrite_path(&m, "/api/foo"), "/api/foo");
    }

    #[test]
    fn test_strip_only_gets_leading_slash() {
        let m = mapping("/api/", true, "");
        assert_eq!(rewrite_path(&m, "/api/foo"), "/foo");
        assert_eq!(rewrite_path(&m, "/api/"), "/");
    }

    #[test]
    fn test_prefix_only() {
        let m = mapping("/api", false, "/internal");
        assert_eq!(rewrite_path(&m, "/api/users"), "/internal/api/users");
    }

    #[test]
    fn test_query_preserved() {
        let m = mapping("/search", true, "/q");
        let uri: Uri = "/search?term=rust&page=2".parse().unwrap();
        assert_eq!(
            upstream_uri(&m, &uri).unwrap().to_string(),
            "http://backend:9000/q?term=rust&page=2"
        );
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let m = mapping("/api/", false, "");
        assert!(matches(&m, "/api/x"));
        assert!(!matches(&m, "/API/x"));
        assert!(!matches(&m, "/ap"));
    }
}
