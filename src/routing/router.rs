//! Route table assembly and lookup.
//!
//! # Responsibilities
//! - Merge static and remotely fetched mappings by name
//! - Order routes so the most specific prefix is found first
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - Longest prefix first, ties by name: insertion order never matters

use std::cmp::Reverse;
use std::collections::BTreeMap;

use axum::http::Uri;

use crate::config::validation::check_route;
use crate::config::RouteMapping;
use crate::routing::{matcher, RouteError};

/// A named route mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub mapping: RouteMapping,
}

impl Route {
    pub fn matches(&self, path: &str) -> bool {
        matcher::matches(&self.mapping, path)
    }

    /// Absolute URI the request should be forwarded to.
    pub fn upstream_uri(&self, uri: &Uri) -> Result<Uri, RouteError> {
        matcher::upstream_uri(&self.mapping, uri)
    }
}

/// Serving-time routing table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build the table from static mappings overlaid with remote ones.
    ///
    /// Remote entries replace static entries with the same name.
    pub fn build<S, R>(static_routes: S, remote_routes: R) -> Result<Self, RouteError>
    where
        S: IntoIterator<Item = (String, RouteMapping)>,
        R: IntoIterator<Item = (String, RouteMapping)>,
    {
        let mut merged: BTreeMap<String, RouteMapping> = static_routes.into_iter().collect();
        for (name, mapping) in remote_routes {
            if merged.insert(name.clone(), mapping).is_some() {
                tracing::debug!(route = %name, "Remote route overrides static route");
            }
        }

        let mut routes = Vec::with_capacity(merged.len());
        for (name, mapping) in merged {
            check_route(&mapping).map_err(|reason| RouteError::InvalidRoute {
                name: name.clone(),
                reason,
            })?;
            routes.push(Route { name, mapping });
        }

        routes.sort_by(|a, b| {
            (Reverse(a.mapping.path.len()), &a.name).cmp(&(Reverse(b.mapping.path.len()), &b.name))
        });

        for route in &routes {
            tracing::info!(
                route = %route.name,
                prefix = %route.mapping.path,
                target = %route.mapping.host,
                strip_prefix = route.mapping.strip_prefix,
                prefix_path = %route.mapping.prefix_path,
                "Route registered"
            );
        }

        Ok(Self { routes })
    }

    /// Most specific route whose prefix the path starts with.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(path))
    }

    /// Routes in match order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(path: &str, host: &str) -> RouteMapping {
        RouteMapping {
            path: path.into(),
            scheme: "http".into(),
            host: host.into(),
            strip_prefix: false,
            prefix_path: String::new(),
        }
    }

    fn none() -> Vec<(String, RouteMapping)> {
        Vec::new()
    }

    fn entry(name: &str, path: &str, host: &str) -> (String, RouteMapping) {
        (name.to_string(), mapping(path, host))
    }

    #[test]
    fn test_longest_prefix_wins_regardless_of_order() {
        let forward = RouteTable::build(
            vec![entry("api", "/api/", "a:1"), entry("v2", "/api/v2/", "b:1")],
            none(),
        )
        .unwrap();
        let backward = RouteTable::build(
            vec![entry("v2", "/api/v2/", "b:1"), entry("api", "/api/", "a:1")],
            none(),
        )
        .unwrap();

        assert_eq!(forward.match_path("/api/v2/x").unwrap().name, "v2");
        assert_eq!(backward.match_path("/api/v2/x").unwrap().name, "v2");
        assert_eq!(forward.match_path("/api/v1/x").unwrap().name, "api");
    }

    #[test]
    fn test_equal_prefix_ties_broken_by_name() {
        let table = RouteTable::build(
            vec![entry("zeta", "/same/", "z:1"), entry("alpha", "/same/", "a:1")],
            none(),
        )
        .unwrap();
        assert_eq!(table.match_path("/same/x").unwrap().name, "alpha");
    }

    #[test]
    fn test_remote_overrides_static_by_name() {
        let table = RouteTable::build(
            vec![entry("api", "/api/", "static:1"), entry("web", "/web/", "web:1")],
            vec![entry("api", "/api/", "remote:1")],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.match_path("/api/x").unwrap().mapping.host, "remote:1");
    }

    #[test]
    fn test_no_match() {
        let table = RouteTable::build(vec![entry("api", "/api/", "a:1")], none()).unwrap();
        assert!(table.match_path("/index.html").is_none());
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let err = RouteTable::build(vec![entry("bad", "", "a:1")], none()).unwrap_err();
        assert!(matches!(err, RouteError::InvalidRoute { ref name, .. } if name == "bad"));
    }
}
