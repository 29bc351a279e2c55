//! Axum server hosting the classification endpoint

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use photoguard_runtime::ModerationPipeline;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::request::parse_submission;
use crate::response::ClassifyResponse;

/// Header carrying the per-request id back to the caller
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_enable_cors() -> bool {
    true
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: default_enable_cors(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Build the router for a pipeline
pub fn router(pipeline: Arc<ModerationPipeline>, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/", post(classify_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline);

    if config.enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        )
    } else {
        app
    }
}

/// Moderation HTTP server
pub struct ModerationServer {
    pipeline: Arc<ModerationPipeline>,
    config: ServerConfig,
}

impl ModerationServer {
    pub fn new(pipeline: Arc<ModerationPipeline>) -> Self {
        Self::with_config(pipeline, ServerConfig::default())
    }

    pub fn with_config(pipeline: Arc<ModerationPipeline>, config: ServerConfig) -> Self {
        Self { pipeline, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        router(self.pipeline.clone(), &self.config)
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        info!(
            addr = %listener.local_addr()?,
            deadline_ms = self.pipeline.config().deadline_ms,
            "Moderation server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

// ============================================================================
// HTTP Handlers
// ============================================================================

async fn classify_handler(State(pipeline): State<Arc<ModerationPipeline>>, body: Bytes) -> Response {
    let submission = match parse_submission(&body) {
        Ok(submission) => submission,
        Err(err) => {
            debug!(error = %err, "Rejected request before pipeline start");
            return Json(ClassifyResponse::from_error(&err)).into_response();
        }
    };

    let run = pipeline.run(submission).await;
    debug!(
        request_id = %run.request_id,
        state = ?run.state,
        elapsed_ms = run.elapsed.as_millis() as u64,
        "Request finished"
    );

    let mut response = Json(ClassifyResponse::from(run.result)).into_response();
    if let Ok(value) = HeaderValue::from_str(&run.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": photoguard_core::VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
