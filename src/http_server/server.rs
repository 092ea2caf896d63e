//! # HTTP Server
//!
//! Combines the health route and the gated table routes into one axum
//! router, then serves it until Ctrl-C or SIGTERM.

use std::sync::Arc;

use axum::extract::Request;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::api::{require_api_key, ApiKeyGate, TableQueryHandler};
use crate::observability::Event;

use super::config::HttpServerConfig;
use super::observability_routes::health_routes;
use super::table_routes::table_routes;

/// HTTP server for the table gateway
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, handler: Arc<TableQueryHandler>, gate: ApiKeyGate) -> Self {
        let router = build_router(&config, handler, gate);
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until a shutdown signal arrives
    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        let addr = listener.local_addr()?;
        tracing::info!(event = %Event::Serving, %addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!(event = %Event::ShutdownComplete);
        Ok(())
    }
}

/// Build the combined router.
///
/// Layer order, outermost first: CORS, request id, tracing. Preflight
/// requests are answered before the key gate runs.
pub fn build_router(
    config: &HttpServerConfig,
    handler: Arc<TableQueryHandler>,
    gate: ApiKeyGate,
) -> Router {
    let gated = table_routes(handler).route_layer(middleware::from_fn_with_state(
        Arc::new(gate),
        require_api_key,
    ));

    Router::new()
        .merge(health_routes())
        .nest("/api", gated)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer(config))
}

fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(event = %Event::ShutdownStart);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HandlerConfig;
    use crate::backend::InMemoryBackend;
    use crate::schema::{ResolverConfig, SchemaResolver};

    fn handler() -> Arc<TableQueryHandler> {
        let backend = Arc::new(InMemoryBackend::new());
        let resolver = Arc::new(SchemaResolver::new(backend.clone(), ResolverConfig::default()));
        Arc::new(TableQueryHandler::new(resolver, backend, HandlerConfig::default()))
    }

    #[test]
    fn test_server_creation() {
        let server = HttpServer::new(
            HttpServerConfig::default(),
            handler(),
            ApiKeyGate::new("key"),
        );
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_origin_list() {
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:5173".into()],
            ..Default::default()
        };
        let server = HttpServer::new(config, handler(), ApiKeyGate::new("key"));
        let _router = server.router();
    }
}
