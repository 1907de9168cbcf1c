//! Reverse-proxy forwarding.
//!
//! # Responsibilities
//! - Rewrite the request URI to the matched route's target
//! - Set `Host` and `X-Forwarded-For`
//! - Stream the upstream response back to the client
//!
//! # Design Decisions
//! - No retries: one attempt per request, failure answers 502
//! - Bodies are streamed in both directions, never buffered

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;

use crate::http::middleware::access_log::MatchedRoute;
use crate::http::request::request_id;
use crate::http::response::strip_hop_by_hop;
use crate::routing::Route;

/// HTTP client used to reach upstreams.
pub type ProxyClient = Client<HttpConnector, Body>;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Build the shared upstream client.
pub fn build_client() -> ProxyClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Forward `request` to the target of `route`.
pub async fn forward(
    client: &ProxyClient,
    route: &Route,
    remote_addr: Option<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let request_id = request_id(&request).unwrap_or("unknown").to_string();
    let (mut parts, body) = request.into_parts();

    let uri = match route.upstream_uri(&parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, route = %route.name, error = %e, "Cannot build upstream URI");
            return with_route(
                (StatusCode::BAD_GATEWAY, "Invalid upstream target").into_response(),
                route,
            );
        }
    };

    strip_hop_by_hop(&mut parts.headers);
    match HeaderValue::from_str(&route.mapping.host) {
        Ok(host) => {
            parts.headers.insert(header::HOST, host);
        }
        Err(e) => {
            tracing::warn!(route = %route.name, error = %e, "Target host is not a valid header value");
        }
    }
    if let Some(addr) = remote_addr {
        let forwarded = match parts
            .headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
        {
            Some(prior) => format!("{}, {}", prior, addr.ip()),
            None => addr.ip().to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded) {
            parts.headers.insert(X_FORWARDED_FOR, value);
        }
    }

    tracing::debug!(
        request_id = %request_id,
        route = %route.name,
        upstream = %uri,
        "Proxying request"
    );

    parts.uri = uri;
    parts.version = Version::HTTP_11;
    let upstream_request = Request::from_parts(parts, body);

    match client.request(upstream_request).await {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(
                request_id = %request_id,
                route = %route.name,
                upstream_status = status.as_u16(),
                "Upstream responded"
            );

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            with_route(Response::from_parts(parts, Body::new(body)), route)
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = %route.name,
                error = %e,
                "Upstream error"
            );
            with_route(
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response(),
                route,
            )
        }
    }
}

fn with_route(mut response: Response, route: &Route) -> Response {
    response
        .extensions_mut()
        .insert(MatchedRoute(route.name.clone()));
    response
}
