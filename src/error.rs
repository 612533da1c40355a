use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::gemini::LayoutError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error("session {0} has no generated layout")]
    NoLayout(Uuid),
    #[error("stored layout for session {0} is not a base64 data URI")]
    CorruptLayout(Uuid),
    #[error("{0}")]
    InvalidInput(String),
    #[error("specifications have validation errors")]
    HasValidationErrors,
    #[error("a layout is already being generated")]
    GenerationInFlight,
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_) | AppError::NoLayout(_) => StatusCode::NOT_FOUND,
            AppError::CorruptLayout(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::HasValidationErrors => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::GenerationInFlight => StatusCode::CONFLICT,
            AppError::Layout(LayoutError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Layout(LayoutError::GenerationFailed) => StatusCode::BAD_GATEWAY,
            AppError::Layout(LayoutError::Unknown) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        } else {
            tracing::info!("⚠️ {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
