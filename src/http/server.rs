//! Request dispatcher.
//!
//! # Responsibilities
//! - Create Axum Router with the health endpoint and the dispatch fallback
//! - Wire up middleware (tracing, request ID, access log, optional timeout)
//! - Dispatch requests to a proxied route or to the static file server
//!
//! # Design Decisions
//! - The dispatcher owns its route table; nothing is registered globally
//! - `/health` is a dedicated route, so no mapping can shadow it
//! - The access log wraps the timeout, so timed-out requests are logged too
//! - Route table is shared read-only via `Arc`

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Extension, Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::middleware::{access_log, MatchedRoute, HEALTH_ROUTE, STATIC_ROUTE};
use crate::http::proxy::{self, ProxyClient};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::static_files::StaticFiles;
use crate::routing::RouteTable;

/// Reserved health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Body returned by the health endpoint.
pub const HEALTH_BODY: &str = "OK";

/// Dispatcher settings taken from the gateway configuration.
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub root_folder: PathBuf,
    pub spa_mode: bool,
    pub request_timeout: Option<Duration>,
}

impl From<&GatewayConfig> for DispatcherSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            root_folder: PathBuf::from(&config.root_folder),
            spa_mode: config.spa_mode,
            request_timeout: config.timeouts.request_secs.map(Duration::from_secs),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct DispatchState {
    pub routes: Arc<RouteTable>,
    pub client: ProxyClient,
    pub static_files: StaticFiles,
}

/// Serves inbound requests from a fixed route table.
pub struct RequestDispatcher {
    router: Router,
    routes: Arc<RouteTable>,
}

impl RequestDispatcher {
    /// Create a dispatcher owning `routes`.
    pub fn new(routes: RouteTable, settings: DispatcherSettings) -> Self {
        let routes = Arc::new(routes);
        let state = DispatchState {
            routes: routes.clone(),
            client: proxy::build_client(),
            static_files: StaticFiles::new(&settings.root_folder, settings.spa_mode),
        };

        tracing::info!(
            routes = routes.len(),
            root_folder = %settings.root_folder.display(),
            spa_mode = settings.spa_mode,
            "Dispatcher ready"
        );

        let router = Self::build_router(&settings, state);
        Self { router, routes }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(settings: &DispatcherSettings, state: DispatchState) -> Router {
        let mut router = Router::new()
            .route(HEALTH_PATH, any(health_handler))
            .fallback(dispatch_handler)
            .with_state(state);

        if let Some(timeout) = settings.request_timeout {
            router = router.layer(TimeoutLayer::new(timeout));
        }

        router
            .layer(middleware::from_fn(access_log))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Routes this dispatcher serves.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The router, for handing to a server or driving directly in tests.
    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Extension(MatchedRoute(HEALTH_ROUTE.to_string())),
        HEALTH_BODY,
    )
}

/// Proxy when a route matches, otherwise serve from disk.
async fn dispatch_handler(State(state): State<DispatchState>, request: Request<Body>) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    match state.routes.match_path(request.uri().path()) {
        Some(route) => proxy::forward(&state.client, route, remote_addr, request).await,
        None => {
            let mut response = state.static_files.serve(request).await;
            response
                .extensions_mut()
                .insert(MatchedRoute(STATIC_ROUTE.to_string()));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn dispatcher(routes: RouteTable) -> RequestDispatcher {
        RequestDispatcher::new(
            routes,
            DispatcherSettings {
                root_folder: PathBuf::from("/nonexistent"),
                spa_mode: false,
                request_timeout: None,
            },
        )
    }

    #[tokio::test]
    async fn test_health_bypasses_catch_all_route() {
        let routes = RouteTable::build(
            vec![(
                "everything".to_string(),
                crate::config::RouteMapping {
                    path: "/".into(),
                    scheme: "http".into(),
                    host: "127.0.0.1:1".into(),
                    strip_prefix: false,
                    prefix_path: String::new(),
                },
            )],
            Vec::<(String, crate::config::RouteMapping)>::new(),
        )
        .unwrap();

        let response = dispatcher(routes)
            .into_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], HEALTH_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_request_id_added_to_response() {
        let response = dispatcher(RouteTable::default())
            .into_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_missing_static_file_is_404() {
        let response = dispatcher(RouteTable::default())
            .into_router()
            .oneshot(Request::builder().uri("/missing.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Log sink shared with a JSON fmt subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Drive one request and return its status plus its access record.
    async fn access_record(
        dispatcher: RequestDispatcher,
        uri: &str,
    ) -> (StatusCode, serde_json::Value) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let response = dispatcher
            .into_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let raw = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = raw
            .lines()
            .find(|line| line.contains("Request completed"))
            .expect("no access record emitted");
        (response.status(), serde_json::from_str(line).unwrap())
    }

    #[tokio::test]
    async fn test_timed_out_request_is_access_logged() {
        // Accepts connections into the backlog and never answers.
        let upstream = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let routes = RouteTable::build(
            vec![(
                "slow".to_string(),
                crate::config::RouteMapping {
                    path: "/slow/".into(),
                    scheme: "http".into(),
                    host: upstream.local_addr().unwrap().to_string(),
                    strip_prefix: false,
                    prefix_path: String::new(),
                },
            )],
            Vec::<(String, crate::config::RouteMapping)>::new(),
        )
        .unwrap();
        let dispatcher = RequestDispatcher::new(
            routes,
            DispatcherSettings {
                root_folder: PathBuf::from("/nonexistent"),
                spa_mode: false,
                request_timeout: Some(Duration::from_millis(200)),
            },
        );

        let (status, record) = access_record(dispatcher, "/slow/x").await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(record["target"], "access");
        assert_eq!(record["status"], 408);
        assert_eq!(record["route"], crate::http::middleware::NO_ROUTE);
        drop(upstream);
    }

    #[tokio::test]
    async fn test_health_and_static_have_their_own_route_labels() {
        let (status, record) = access_record(dispatcher(RouteTable::default()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["route"], HEALTH_ROUTE);

        let (status, record) =
            access_record(dispatcher(RouteTable::default()), "/missing.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(record["status"], 404);
        assert_eq!(record["route"], STATIC_ROUTE);
    }
}
