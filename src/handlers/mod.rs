use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::utils::error::AppError;
use crate::AppState;

pub mod events;
pub mod meta;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadinessPayload {
    status: &'static str,
    db: &'static str,
}

/// Liveness: the process is up and serving requests.
pub async fn health_check() -> Response {
    Json(HealthPayload { status: "ok" }).into_response()
}

/// Readiness: storage answers a trivial query.
pub async fn readiness_check(State(state): State<AppState>) -> Result<Response, AppError> {
    if let Err(e) = state.db.ping().await {
        tracing::warn!(error = ?e, "Readiness probe failed");
        return Err(AppError::ServiceUnavailable("unready".to_string()));
    }

    Ok(Json(ReadinessPayload {
        status: "ok",
        db: "ok",
    })
    .into_response())
}
