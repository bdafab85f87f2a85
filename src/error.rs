use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::users::{store::StoreError, validation::ValidationError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Email already in use")]
    DuplicateEmail,

    #[error("User not found")]
    NotFound,

    /// Store detail is kept for logs; clients only see the action.
    #[error("Error {action} user")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Maps a store failure during `action` ("creating", "updating", ...).
    pub fn store(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::DuplicateEmail => ApiError::DuplicateEmail,
            source => ApiError::Store { action, source },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidBody(_) | ApiError::DuplicateEmail => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store { action, source } = &self {
            tracing::error!(error = %source, action, "store operation failed");
        }
        let status = self.status_code();
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
