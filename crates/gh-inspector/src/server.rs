//! HTTP API for scoring repositories
//!
//! Provides /api/v1/score, /health, /metrics and / endpoints.

use crate::analyzer::Analyzer;
use crate::formatter::Record;
use crate::stats::StatsRecorder;
use crate::types::{
    ErrorResponse, HealthResponse, RepositoryError, ScoreRequest, ScoreResponse, ServiceInfo,
    MAX_REPOSITORIES_PER_REQUEST,
};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use repo_metrics::{CancellationToken, Recorder};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub analyzer: Analyzer,
    pub stats: Arc<StatsRecorder>,
    pub request_timeout: Duration,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(analyzer: Analyzer, stats: Arc<StatsRecorder>, request_timeout: Duration) -> Self {
        Self {
            analyzer,
            stats,
            request_timeout,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

fn error_response(status: StatusCode, message: &str, code: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/v1/score", post(score))
        .layer(middleware::from_fn_with_state(state.clone(), record_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server and run until `shutdown` resolves
pub async fn start_server<F>(state: SharedState, port: u16, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn record_requests(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    state
        .stats
        .record_http_request(&method, &path, status.as_str());
    state
        .stats
        .record_http_duration(&method, &path, started.elapsed());
    if status.is_server_error() {
        warn!(method = %method, path = %path, status = status.as_u16(), "Request failed");
    }

    response
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::current())
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let now = Utc::now();
    let uptime_secs = (now - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: now,
        uptime_secs,
    })
}

/// Prometheus scrape endpoint
async fn metrics(State(state): State<SharedState>) -> Response {
    match state.stats.render() {
        Ok(body) => ([(header::CONTENT_TYPE, state.stats.content_type())], body).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
                "METRICS_UNAVAILABLE",
            )
        }
    }
}

async fn score(
    State(state): State<SharedState>,
    body: Result<Json<ScoreRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => {
            warn!(error = %e, "Rejected score request");
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid request body",
                "INVALID_REQUEST",
            );
        }
    };

    if let Some(format) = request.ignored_output_format() {
        warn!(output_format = %format, "Ignoring output_format, responses are always JSON");
    }

    if request.repositories.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "No repositories provided",
            "NO_REPOSITORIES",
        );
    }
    if request.repositories.len() > MAX_REPOSITORIES_PER_REQUEST {
        return error_response(
            StatusCode::BAD_REQUEST,
            &format!(
                "Too many repositories (max {})",
                MAX_REPOSITORIES_PER_REQUEST
            ),
            "TOO_MANY_REPOSITORIES",
        );
    }

    // Cancelled on timeout, or when the client goes away and this future is dropped
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let deadline = {
        let cancel = cancel.clone();
        let timeout = state.request_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        })
    };

    let report = state
        .analyzer
        .analyze_all(&cancel, &request.repositories)
        .await;
    deadline.abort();

    let now = Utc::now();
    let response = ScoreResponse {
        repositories: report
            .repositories()
            .map(|attrs| Record::from_attributes(attrs, now))
            .collect(),
        timestamp: now,
        total_count: report.total(),
        success_count: report.succeeded(),
        error_count: report.failed(),
        errors: report
            .errors()
            .map(|(repository, e)| RepositoryError {
                repository: repository.to_string(),
                error: e.to_string(),
            })
            .collect(),
    };

    info!(
        total = response.total_count,
        succeeded = response.success_count,
        failed = response.error_count,
        "Scored repositories"
    );

    Json(response).into_response()
}
