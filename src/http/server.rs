//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the single gateway handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Classify each request and dispatch it to the relay, the proxy, the
//!   local file servers, or the fallback HTML
//! - Serve until the shutdown signal fires

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, FromRequestParts, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::feed::FeedEndpoint;
use crate::http::fallback::FallbackHtml;
use crate::http::headers::LocalResponseHeaders;
use crate::http::origin::ExternalOrigin;
use crate::http::proxy::HttpProxy;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::ProxyError;
use crate::http::static_files::StaticFiles;
use crate::http::websocket::{self, RelayTarget};
use crate::instance::PiralInstance;
use crate::net::SessionTracker;
use crate::observability::metrics;
use crate::routing::{
    DirectoryProbe, DiscoveredFiles, RouteKind, Router as GatewayRouter, SharedRouter,
};

/// Directories and manifests the gateway serves from.
#[derive(Debug, Clone)]
pub struct SitePaths {
    /// Pilet build output, served under `<api>/0/`.
    pub dist_dir: PathBuf,
    /// Physical app shell files.
    pub app_dir: PathBuf,
    /// `package.json` of the app shell, listing website emulator files.
    pub app_shell_manifest: PathBuf,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: SharedRouter,
    pub proxy: HttpProxy,
    pub discovered: Arc<DiscoveredFiles>,
    pub app_entries: Arc<DirectoryProbe>,
    pub app_files: Arc<StaticFiles>,
    pub pilet_files: Arc<StaticFiles>,
    pub fallback: Arc<FallbackHtml>,
    pub sessions: SessionTracker,
    pub default_host: Arc<str>,
    pub max_message_size: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    sessions: SessionTracker,
}

impl HttpServer {
    /// Create a new HTTP server. The feed endpoint must already be known.
    pub fn new(
        config: GatewayConfig,
        instance: &PiralInstance,
        paths: SitePaths,
        feed: FeedEndpoint,
    ) -> Self {
        Self::with_discovered(
            config,
            instance,
            paths.clone(),
            feed,
            DiscoveredFiles::new(paths.app_shell_manifest),
        )
    }

    /// Like [`HttpServer::new`], with the website file set supplied.
    pub fn with_discovered(
        config: GatewayConfig,
        instance: &PiralInstance,
        paths: SitePaths,
        feed: FeedEndpoint,
        discovered: DiscoveredFiles,
    ) -> Self {
        let headers = LocalResponseHeaders::new(config.environment.clone(), config.is_development());
        let sessions = SessionTracker::new();

        let state = AppState {
            router: Arc::new(GatewayRouter::new(&config.forwarded_paths, instance.is_website)),
            proxy: HttpProxy::new(feed),
            discovered: Arc::new(discovered),
            app_entries: Arc::new(DirectoryProbe::new(&paths.app_dir)),
            app_files: Arc::new(StaticFiles::new(&paths.app_dir, headers.clone())),
            pilet_files: Arc::new(StaticFiles::new(&paths.dist_dir, headers.clone())),
            fallback: Arc::new(FallbackHtml::new(&paths.app_dir, headers)),
            sessions: sessions.clone(),
            default_host: config.listener.bind_address.as_str().into(),
            max_message_size: config.websocket.max_message_size,
        };

        let router = Self::build_router(&config, state);
        Self { router, sessions }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The timeout covers the handler until response headers exist, so a
    /// feed that never answers is reported as 504.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for driving the server without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!(
            open_relay_sessions = self.sessions.active_count(),
            "HTTP server stopped"
        );
        Ok(())
    }
}

/// Classifies the request and hands it to exactly one route handler.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().clone();

    let no_files = HashSet::new();
    let website_files = if state.router.is_website() {
        state.discovered.get().await
    } else {
        &no_files
    };

    let route = state
        .router
        .classify(&request, website_files, state.app_entries.as_ref());
    let route_label = route.as_str();
    let origin = ExternalOrigin::from_request(&request, &state.default_host);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        route = route_label,
        "Routing request"
    );

    let response = match route {
        RouteKind::DirectPiletFile { path } => state.pilet_files.serve_sub_path(request, &path).await,
        RouteKind::PiletApiWebSocket => {
            let path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string());
            let (mut parts, _body) = request.into_parts();

            match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
                Ok(ws) => {
                    let target = RelayTarget {
                        feed: state.proxy.feed().clone(),
                        origin,
                        path,
                        max_message_size: state.max_message_size,
                    };
                    websocket::upgrade(ws, target, state.sessions.clone())
                }
                Err(rejection) => {
                    tracing::warn!(request_id = %request_id, error = %rejection, "WebSocket upgrade rejected");
                    rejection.into_response()
                }
            }
        }
        RouteKind::PiletApiMeta => state
            .proxy
            .forward_rewritten(request, &origin)
            .await
            .unwrap_or_else(|e| upstream_failure(e, &request_id)),
        RouteKind::ForwardedPath => state
            .proxy
            .forward(request)
            .await
            .unwrap_or_else(|e| upstream_failure(e, &request_id)),
        RouteKind::WebsiteAsset { name } => {
            tracing::info!(request_id = %request_id, name = %name, "Proxy website file");
            state
                .proxy
                .forward(request)
                .await
                .unwrap_or_else(|e| upstream_failure(e, &request_id))
        }
        RouteKind::StaticFile { path } => {
            tracing::trace!(request_id = %request_id, path = %path.display(), "Local file");
            state.app_files.serve(request).await
        }
        RouteKind::Fallback => state.fallback.render(&origin).await,
    };

    metrics::record_request(route_label, response.status().as_u16(), start_time);
    response
}

fn upstream_failure(error: ProxyError, request_id: &str) -> Response {
    tracing::error!(request_id = %request_id, error = %error, "Upstream error");
    error.into_response()
}
