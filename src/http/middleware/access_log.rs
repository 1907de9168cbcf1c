//! Access log middleware.
//! Emits one structured line per request with its final status.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;

use crate::http::request::request_id;
use crate::observability::metrics;

/// Label of whatever produced a response: a proxy route name, the health
/// endpoint or the static file server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

pub const HEALTH_ROUTE: &str = "health";
pub const STATIC_ROUTE: &str = "static";

/// Label for responses produced outside any handler, such as timeouts.
pub const NO_ROUTE: &str = "-";

pub async fn access_log(request: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let version = request.version();
    let request_id = request_id(&request).unwrap_or("unknown").to_string();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let route = response
        .extensions()
        .get::<MatchedRoute>()
        .map(|r| r.0.as_str())
        .unwrap_or(NO_ROUTE);

    tracing::info!(
        target: "access",
        request_id = %request_id,
        method = %method,
        path = %path,
        protocol = ?version,
        remote_addr = %remote_addr,
        status,
        route,
        latency_ms = start_time.elapsed().as_secs_f64() * 1000.0,
        "Request completed"
    );
    metrics::record_request(method.as_str(), status, route, start_time);

    response
}
