use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::{CreateEventRequest, SearchParams, UpdateEventRequest};
use crate::repositories;
use crate::utils::error::AppError;
use crate::utils::response::{created, no_content, paginated};
use crate::AppState;

/// Carries the unpaginated match count of a search.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    let event = payload.validate()?;

    let created_event = repositories::create_event(&state.db, &event).await?;
    tracing::info!(id = created_event.id, "Event created");
    Ok(created(created_event))
}

pub async fn search_events(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| AppError::validation(e.body_text()))?;
    let query = params.validate()?;

    let page = repositories::search_events(&state.db, &query).await?;
    Ok(paginated(page.items, TOTAL_COUNT_HEADER, page.total))
}

pub async fn get_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let id = event_id(id)?;

    repositories::get_event(&state.db, id)
        .await?
        .map(|event| Json(event).into_response())
        .ok_or_else(|| AppError::event_not_found(id))
}

pub async fn update_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = event_id(id)?;
    let Json(payload) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    let changes = payload.validate()?;

    repositories::update_event(&state.db, id, &changes)
        .await?
        .map(|event| Json(event).into_response())
        .ok_or_else(|| AppError::event_not_found(id))
}

pub async fn delete_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let id = event_id(id)?;

    if repositories::delete_event(&state.db, id).await? {
        tracing::info!(id, "Event deleted");
        Ok(no_content())
    } else {
        Err(AppError::event_not_found(id))
    }
}

fn event_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    id.map(|Path(id)| id)
        .map_err(|e| AppError::validation(format!("event id: {}", e.body_text())))
}
