use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

pub fn created<T>(data: T) -> Response
where
    T: Serialize,
{
    (StatusCode::CREATED, Json(data)).into_response()
}

/// A JSON list with its unpaginated size in a response header.
pub fn paginated<T>(items: T, header: &'static str, total: i64) -> Response
where
    T: Serialize,
{
    (
        StatusCode::OK,
        [(HeaderName::from_static(header), HeaderValue::from(total))],
        Json(items),
    )
        .into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub fn error(
    code: &str,
    message: impl Into<String>,
    details: Option<Value>,
    status: StatusCode,
) -> Response {
    let body = ApiErrorResponse {
        success: false,
        error: ApiErrorBody {
            code: code.to_string(),
            message: message.into(),
            details,
        },
    };

    (status, Json(body)).into_response()
}
