//! Axum HTTP server: router, listener, graceful shutdown.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderName, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::api;
use crate::config::GatewayConfig;
use crate::correlation::{CorrelationId, CORRELATION_HEADER};
use crate::forwarder::RequestForwarder;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub forwarder: RequestForwarder,
}

impl AppState {
    /// Build the state, including the upstream HTTP client.
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.upstream.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(
                config.upstream.connect_timeout_secs,
            ))
            .build()?;
        let forwarder = RequestForwarder::new(client, config.forwarder());
        Ok(Self { config, forwarder })
    }
}

/// The full application router.
pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.config.server.max_body_bytes;

    Router::new()
        .nest("/api", api::router())
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(correlate))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Build and run the HTTP server.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let listen_addr = state.config.server.listen_address.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "dossier-gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("dossier-gateway shut down gracefully");
    Ok(())
}

/// Attach a correlation ID to the request and echo it on the response.
///
/// The ID is stored both as an extension and as the inbound header, so
/// handlers that rebuild the request head keep it.
async fn correlate(mut request: Request, next: Next) -> Response {
    let correlation_id = CorrelationId::of(&request);
    request
        .headers_mut()
        .insert(CORRELATION_HEADER, correlation_id.header_value());
    request.extensions_mut().insert(correlation_id.clone());

    let span = dossier_tracing::gateway_request_span!(
        &correlation_id,
        request.method(),
        request.uri().path()
    );

    let mut response = next.run(request).instrument(span.clone()).await;
    span.record("status", response.status().as_u16());

    response.headers_mut().insert(
        HeaderName::from_static(CORRELATION_HEADER),
        correlation_id.header_value(),
    );
    response
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn handle_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({ "error": "not_found" })),
    )
        .into_response()
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
