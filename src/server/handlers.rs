use crate::model::{ErrorInfo, RawAnalysisRequest};
use crate::server::AppState;
use crate::AnalyzerError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound for each health probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Error envelope: `{"status": "error", "error": ErrorInfo}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    info: ErrorInfo,
}

impl ApiError {
    pub fn new(status: StatusCode, info: ErrorInfo) -> Self {
        Self { status, info }
    }

    pub fn from_error(err: &AnalyzerError, elapsed_seconds: f64) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, ErrorInfo::from_error(err, elapsed_seconds))
    }

    fn bad_json(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorInfo::new(
                "INVALID_INPUT",
                rejection.body_text(),
                "ValidationError",
                0.0,
            ),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"status": "error", "error": self.info})),
        )
            .into_response()
    }
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawAnalysisRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let Json(raw) = payload.map_err(ApiError::bad_json)?;
    let request = raw
        .validate()
        .map_err(|e| ApiError::from_error(&e, 0.0))?;

    match state.pipeline.run(&request).await {
        Ok(report) => Ok(Json(json!({"status": "success", "data": report})).into_response()),
        Err(err) => Err(ApiError::from_error(
            &err,
            started.elapsed().as_secs_f64(),
        )),
    }
}

pub async fn analyze_async(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawAnalysisRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(raw) = payload.map_err(ApiError::bad_json)?;
    let request = raw
        .validate()
        .map_err(|e| ApiError::from_error(&e, 0.0))?;

    let job_id = state.jobs.submit(state.pipeline.clone(), request);
    tracing::info!(job_id = %job_id, "Analysis job accepted");

    let body = json!({
        "status": "accepted",
        "job_id": job_id,
        "status_url": format!("/api/status/{}", job_id),
        "message": "Analysis job submitted; poll status_url for progress",
    });
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    match state.jobs.get(&job_id) {
        Some(record) => Ok(Json(record.view()).into_response()),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            ErrorInfo::new(
                "JOB_NOT_FOUND",
                format!("No job with id {}", job_id),
                "NotFoundError",
                0.0,
            ),
        )),
    }
}

async fn probe<F, E>(probe: F) -> serde_json::Value
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(())) => json!({"status": "up"}),
        Ok(Err(e)) => json!({"status": "down", "detail": e.to_string()}),
        Err(_) => json!({"status": "down", "detail": "probe timed out"}),
    }
}

/// Reports provider reachability without spending search or generation quota
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pipeline = &state.pipeline;

    let (search, analysis) = tokio::join!(
        probe(pipeline.search_client().probe()),
        probe(pipeline.analysis_client().probe()),
    );

    let cache = match pipeline.cache() {
        None => json!({"status": "disabled"}),
        Some(cache) => match cache.ping() {
            Ok(()) => json!({"status": "up"}),
            Err(e) => json!({"status": "down", "detail": e.to_string()}),
        },
    };
    let fetch = json!({
        "status": "up",
        "max_concurrent": pipeline.fetch_coordinator().max_concurrent(),
    });

    let healthy = [&search, &analysis, &cache]
        .iter()
        .all(|service| service["status"] != "down");
    let status = if healthy { "healthy" } else { "degraded" };
    if !healthy {
        tracing::warn!(%search, %analysis, %cache, "Health check degraded");
    }

    Json(json!({
        "status": status,
        "timestamp": Utc::now(),
        "services": {
            "search": search,
            "analysis": analysis,
            "fetch": fetch,
            "cache": cache,
        },
    }))
}

pub async fn version() -> impl IntoResponse {
    Json(json!({
        "api_version": env!("CARGO_PKG_VERSION"),
        "build_target": format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
    }))
}

pub async fn service_info() -> impl IntoResponse {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Topic research reports from live search results",
        "endpoints": {
            "analyze": "POST /api/analyze",
            "analyze_async": "POST /api/analyze-async",
            "status": "GET /api/status/{job_id}",
            "health": "GET /api/health",
            "version": "GET /api/version",
        },
    }))
}
