//! HTTP service for recording assessment results.
//!
//! Exposes the assessment store over a small axum API:
//! - `GET /health` - liveness probe
//! - `POST /assessments` - record one evaluated QA interaction
//! - `GET /assessments` - list recent records
//! - `GET /assessments/:id` - fetch one record
//!
//! Each request owns its own database write; there is no shared mutable
//! state beyond the connection pool.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::storage::{Assessment, Database, DatabaseError, NewAssessment};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
}

/// Builds the service router over the given database.
pub fn build_router(db: Arc<Database>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/assessments", post(create_assessment).get(list_assessments))
        .route("/assessments/:id", get(get_assessment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { db })
}

/// Binds `addr` and serves the assessment API until the process exits.
pub async fn serve(addr: &str, db: Database) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Assessment service listening");

    axum::serve(listener, build_router(Arc::new(db))).await?;
    Ok(())
}

/// Error wrapper translating storage failures into HTTP responses.
pub struct ApiError(DatabaseError);

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Assessment request failed");
        }

        (status, Json(ErrorBody {
            error: self.0.to_string(),
        }))
            .into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
struct ListParams {
    limit: Option<i64>,
}

/// Default number of records returned by the list endpoint.
const DEFAULT_LIST_LIMIT: i64 = 50;

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn create_assessment(
    State(state): State<AppState>,
    Json(payload): Json<NewAssessment>,
) -> Result<(StatusCode, Json<Assessment>), ApiError> {
    let assessment = state.db.insert_assessment(&payload).await?;

    tracing::info!(id = %assessment.id, "Recorded assessment");
    Ok((StatusCode::CREATED, Json(assessment)))
}

async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assessment>, ApiError> {
    let assessment = state.db.get_assessment(id).await?;
    Ok(Json(assessment))
}

async fn list_assessments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Assessment>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 500);
    let assessments = state.db.list_assessments(limit).await?;
    Ok(Json(assessments))
}
