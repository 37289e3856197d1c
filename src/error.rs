//! Error types shared by the backend client, the workflows and the HTTP layer.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure reported by (or while talking to) the backing store.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The store answered and refused the operation.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Admin operations need the service-role key.
    #[error("Server configuration error: {0}")]
    MissingCredentials(&'static str),

    #[error("Cannot reach backing store: {0}")]
    Transport(String),

    #[error("Unexpected response from backing store: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        BackendError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        BackendError::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Error returned by HTTP handlers, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected { .. } => ApiError::BadRequest(err.to_string()),
            BackendError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            BackendError::MissingCredentials(_)
            | BackendError::Transport(_)
            | BackendError::Decode(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
