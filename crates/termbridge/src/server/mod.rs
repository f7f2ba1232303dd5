//! HTTP API server
//!
//! Exposes the translation pipeline over two endpoints:
//! - `POST /api/translate` - streams translation output as Server-Sent Events
//! - `GET /api/health` - liveness and version
//!
//! The translate handler rejects misconfigured or invalid requests with a
//! JSON error body before any model call, and otherwise forwards the
//! orchestrator's event sequence line by line as it is produced.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, TermbridgeError};
use crate::gateway::ChatModel;
use crate::translate::{
    EventStream, Orchestrator, StreamEvent, TranslateError, TranslateRequest,
    TranslationDirection,
};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration
    pub config: Config,
    /// Chat model backend, used here only for the availability check
    pub gateway: Arc<dyn ChatModel>,
    /// Request orchestration pipeline
    pub orchestrator: Arc<Orchestrator>,
}

/// The API server
pub struct ApiServer {
    config: Config,
    gateway: Arc<dyn ChatModel>,
    orchestrator: Arc<Orchestrator>,
}

impl ApiServer {
    pub fn new(
        config: Config,
        gateway: Arc<dyn ChatModel>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            config,
            gateway,
            orchestrator,
        }
    }

    /// Start the server and listen for requests until shutdown
    pub async fn serve(&self) -> Result<()> {
        let state = Arc::new(AppState {
            config: self.config.clone(),
            gateway: Arc::clone(&self.gateway),
            orchestrator: Arc::clone(&self.orchestrator),
        });

        let app = create_router(state);

        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| TermbridgeError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting API server on {addr}");

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TermbridgeError::Server(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TermbridgeError::Server(format!("Server error: {e}")))?;

        tracing::info!("API server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/translate", post(translate_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire form of a translation request, validated into a `TranslateRequest`
#[derive(Debug, Deserialize)]
pub struct TranslatePayload {
    pub content: String,
    #[serde(default)]
    pub direction: Option<TranslationDirection>,
    #[serde(default)]
    pub auto_detect: bool,
}

/// Health check endpoint
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Translation endpoint - streams SSE on success, JSON error otherwise
async fn translate_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TranslatePayload>,
) -> Response<Body> {
    let request_id = Uuid::new_v4();
    tracing::info!(
        %request_id,
        auto_detect = payload.auto_detect,
        "Translation request received"
    );

    if !state.gateway.is_available().await {
        tracing::error!(%request_id, "Model credential not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI_SERVICE_ERROR",
            "service is not configured, contact the administrator",
        );
    }

    let request = match TranslateRequest::new(
        payload.content,
        payload.direction,
        payload.auto_detect,
        &state.config.limits,
    ) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(%request_id, "Invalid translation request: {e}");
            return error_response(StatusCode::BAD_REQUEST, e.code(), &e.to_string());
        }
    };

    match state.orchestrator.run(request).await {
        Ok(events) => sse_response(events),
        Err(TranslateError::LowConfidence { confidence }) => {
            tracing::warn!(%request_id, confidence, "Rejecting low-confidence detection");
            error_response(
                StatusCode::BAD_REQUEST,
                "LOW_CONFIDENCE",
                &format!(
                    "could not determine the content type (confidence: {:.0}%), pick a direction manually",
                    confidence * 100.0
                ),
            )
        }
    }
}

/// Render the event sequence as an SSE body, one line per event,
/// flushed as produced
fn sse_response(events: EventStream) -> Response<Body> {
    let body = Body::from_stream(
        events.map(|event| Ok::<_, Infallible>(Bytes::from(encode_sse_line(&event)))),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/event-stream")
        .header("cache-control", "no-cache")
        .header("connection", "keep-alive")
        .body(body)
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap()
        })
}

/// One SSE line per protocol event
fn encode_sse_line(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Metadata(meta) => {
            let payload = serde_json::to_string(meta).unwrap_or_else(|_| "{}".to_string());
            format!("data: [META] {payload}\n\n")
        }
        StreamEvent::Advisory(text) => format!("data: > {text}\n\n"),
        StreamEvent::Fragment(text) => format!("data: {text}\n\n"),
        StreamEvent::Done => "data: [DONE]\n\n".to_string(),
        StreamEvent::Error(message) => format!("data: [ERROR] {message}\n\n"),
    }
}

/// Create a JSON error response with a machine-readable code
fn error_response(status: StatusCode, error_code: &str, detail: &str) -> Response<Body> {
    let body = serde_json::json!({
        "detail": detail,
        "error_code": error_code,
    });

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap()
        })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
