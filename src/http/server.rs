//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that feeds every request into the dispatcher
//! - Wire up middleware (timeout, request ID, tracing)
//! - Buffer request bodies up to the configured limit
//! - Bind server to listener and stop on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::http::request::{RequestIdExt, UuidRequestId};
use crate::routing::Router as RouteRouter;

/// Application state injected into the handler.
#[derive(Clone)]
struct AppState {
    dispatcher: Dispatcher,
    body_limit: usize,
}

/// HTTP front end for a dispatcher.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Freeze `routes` and build the server around them.
    pub fn new(config: AppConfig, routes: RouteRouter) -> Self {
        Self::from_dispatcher(Dispatcher::new(routes, config))
    }

    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        let config = dispatcher.config().clone();
        let state = AppState {
            dispatcher,
            body_limit: config.limits.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The assembled router, for serving elsewhere or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Catch-all handler: every request goes through the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let raw_body = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                request_id = parts.headers.request_id().unwrap_or("-"),
                limit = state.body_limit,
                error = %e,
                "Request body rejected"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
    };

    let mut ctx = state.dispatcher.context(parts.method, &target);
    ctx.request_id = parts.headers.request_id().map(str::to_string);
    ctx.headers = parts.headers;
    ctx.raw_body = raw_body;

    let outcome = state.dispatcher.dispatch(&mut ctx).await;
    tracing::debug!(
        request_id = ctx.request_id.as_deref().unwrap_or("-"),
        outcome = outcome.label(),
        status = %ctx.response().status(),
        "Request dispatched"
    );

    ctx.into_response().into_response()
}
