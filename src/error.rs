use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::CookResponse;

#[derive(Debug, Error)]
pub enum CookError {
    // Bad request shape; nothing was looked up or generated
    #[error("{0}")]
    Validation(String),

    // Service answered with no content; not cached
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CookError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CookError::Validation(_) => StatusCode::BAD_REQUEST,
            CookError::GenerationUnavailable(_) => StatusCode::OK,
            CookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CookError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            CookError::GenerationUnavailable(reason) => (
                status,
                Json(CookResponse::failed(format!(
                    "The kitchen could not come up with a result ({reason})."
                ))),
            )
                .into_response(),
            // detail stays generic; the cause is in the logs
            CookError::Internal(_) => (
                status,
                Json(json!({ "detail": "Internal server error during cooking." })),
            )
                .into_response(),
            CookError::Validation(message) => {
                (status, Json(json!({ "detail": message }))).into_response()
            }
        }
    }
}
