//! HTTP error responses for the JSON API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::error::StonkError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &StonkError) -> StatusCode {
    match err {
        StonkError::ConfigMissing { .. }
        | StonkError::ConfigInvalid { .. }
        | StonkError::ConfigParse { .. }
        | StonkError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        StonkError::NoData { .. } | StonkError::InsufficientData { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StonkError::Source { .. } => StatusCode::BAD_GATEWAY,
        StonkError::Database { .. }
        | StonkError::DatabaseQuery { .. }
        | StonkError::Io(_)
        | StonkError::Csv(_)
        | StonkError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<StonkError> for WebError {
    fn from(err: StonkError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            tracing::error!("request failed: {err}");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
