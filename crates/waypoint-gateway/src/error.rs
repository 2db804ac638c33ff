use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use waypoint_redirector::RedirectorError;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// A backend the redirect decision depends on cannot be reached.
    Unavailable(String),
    Internal(String),
}

impl From<RedirectorError> for AppError {
    fn from(error: RedirectorError) -> Self {
        if error.is_unavailable() {
            AppError::Unavailable(error.to_string())
        } else {
            AppError::Internal(error.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            AppError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
