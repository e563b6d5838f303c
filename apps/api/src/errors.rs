use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors that escape to the HTTP boundary.
///
/// Provider failures never end up here: the composer absorbs them and answers
/// with defaulted or templated output. Only genuinely unexpected failures do.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let detail = match &self {
            AppError::MalformedBody(msg) => {
                tracing::error!("Malformed request body: {msg}");
                msg.clone()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                e.to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "message": "Internal Server Error",
            "error": detail
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
