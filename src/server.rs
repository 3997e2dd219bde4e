//! HTTP surface.
//!
//! A thin JSON API over the [`Orchestrator`]. Each request gets its own
//! request state; the store is the only shared resource.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/query` | Run a query, return `{query, intent, response, error}` |
//! | `POST` | `/query/detailed` | Run a query, return the full request state |
//! | `GET`  | `/health` | Liveness (returns service name and version) |
//!
//! # Error Contract
//!
//! Transport errors use a fixed body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Handler failures are not transport errors: they come back as `200` with
//! an error-shaped envelope in `response`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use hiring_orchestrator_core::models::RequestState;
use hiring_orchestrator_core::{Orchestrator, QueryResponse};

use crate::ask::build_orchestrator;
use crate::config::Config;

const COMPONENT: &str = "server";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs until the process is terminated. Returns an error if the store,
/// inference client or listener cannot be set up.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config).await?);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;

    tracing::info!(component = COMPONENT, bind = %config.server.bind, "server listening");
    println!("Hiring orchestrator listening on http://{}", config.server.bind);

    serve(listener, orchestrator).await
}

/// Serve the API on an already-bound listener.
pub async fn serve(
    listener: tokio::net::TcpListener,
    orchestrator: Arc<Orchestrator>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

/// Build the router with all routes and the CORS layer.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/query", post(handle_query))
        .route("/query/detailed", post(handle_query_detailed))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { orchestrator })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

/// Validate the request body and return the query text.
fn extract_query(payload: Result<Json<QueryRequest>, JsonRejection>) -> Result<String, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;
    if request.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    Ok(request.query)
}

async fn handle_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let query = extract_query(payload)?;
    Ok(Json(state.orchestrator.process_query(&query).await))
}

// ============ POST /query/detailed ============

async fn handle_query_detailed(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<RequestState>, AppError> {
    let query = extract_query(payload)?;
    Ok(Json(state.orchestrator.run(&query).await))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"healthy"` when the server is running.
    status: String,
    service: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "hiring-orchestrator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
