//! HTTP API
//!
//! Routes (all JSON):
//! - `POST /api/analyze` - run the pipeline and return the report
//! - `POST /api/analyze-async` - submit a job, answer 202 with its id
//! - `GET /api/status/{job_id}` - job progress and outcome
//! - `GET /api/health` - provider reachability, always 200
//! - `GET /api/version` - build information
//! - `GET /` - service information

mod handlers;

pub use handlers::ApiError;

use crate::config::{Config, ServerConfig};
use crate::jobs::JobTracker;
use crate::pipeline::Pipeline;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub jobs: Arc<JobTracker>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, jobs: JobTracker) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            jobs: Arc::new(jobs),
        }
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim_end_matches('/')) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Builds the application router
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::service_info))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/analyze-async", post(handlers::analyze_async))
        .route("/api/status/{job_id}", get(handlers::job_status))
        .route("/api/health", get(handlers::health))
        .route("/api/version", get(handlers::version))
        .with_state(state)
        .layer(cors_layer(config))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

/// Binds the configured address and serves until the process is stopped
pub async fn serve(config: &Config, pipeline: Pipeline) -> crate::Result<()> {
    let state = Arc::new(AppState::new(pipeline, JobTracker::from_config(&config.jobs)));
    let app = router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "SEO Analyzer API listening");

    axum::serve(listener, app).await?;
    Ok(())
}
