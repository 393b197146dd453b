use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::games::validation::Violations;

/// Failures reported by the storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Error surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("validation failed")]
    Validation(Violations),
    #[error("{0}")]
    DuplicateKey(String),
    #[error("not found")]
    NotFound,
    #[error("invalid identity reference")]
    InvalidIdentity,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Violations>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::DuplicateKey(_) | AppError::InvalidIdentity => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { field, value } => {
                AppError::DuplicateKey(format!("{field} {value} already exists"))
            }
            StoreError::NotFound => AppError::NotFound,
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<Violations> for AppError {
    fn from(v: Violations) -> Self {
        AppError::Validation(v)
    }
}

/// Unwraps a JSON body, reporting malformed input as a violation on `body`.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::Validation(Violations::single("body", e.body_text())))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                ErrorBody {
                    error: "internal server error".into(),
                    details: None,
                }
            }
            AppError::Validation(v) => ErrorBody {
                error: self.to_string(),
                details: Some(v),
            },
            other => ErrorBody {
                error: other.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
