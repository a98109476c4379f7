//! Axum request handlers for all service endpoints.

pub mod auth;
pub mod tasks;
pub mod users;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{ErrorResponse, HealthResponse},
    ServiceError,
};
use tracing::warn;

use super::state::AppState;

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` when the database answers, `503 Service Unavailable`
/// otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let database_ready = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "database ping failed");
            false
        }
    };

    let (status_code, status_str) = if database_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        database_ready,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// Reject blank identity fields.
fn require_filled(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}
