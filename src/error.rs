use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

/// Error kinds the handlers can produce. Every request ends in either a
/// success response or exactly one of these, converted at the handler
/// boundary via `IntoResponse`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad id format or a payload that failed parsing/validation.
    #[error("{0}")]
    MalformedInput(String),

    /// No active row matches the requested id.
    #[error("{0}")]
    NotFound(&'static str),

    /// A write would violate username/email uniqueness among active users.
    #[error("{0}")]
    Conflict(&'static str),

    /// Any other storage failure.
    #[error(transparent)]
    Internal(sqlx::Error),
}

/// JSON body attached to every 4xx/5xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(%status, error = %message, "request failed");
        } else {
            warn!(%status, error = %message, "request rejected");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Two concurrent creates can both pass the uniqueness pre-check; the
/// loser then trips the partial unique index. That storage-level violation
/// must surface as the same Conflict the pre-check would have produced.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ApiError::Conflict("Duplicate value for a unique field");
            }
        }
        ApiError::Internal(err)
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rej: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::MalformedInput(rej.body_text())
    }
}

impl From<axum::extract::rejection::PathRejection> for ApiError {
    fn from(_: axum::extract::rejection::PathRejection) -> Self {
        ApiError::MalformedInput("Invalid ID".into())
    }
}
