use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::aggregate::GroupError;
use crate::services::exam_lock::LockError;
use crate::services::reconcile::MarksError;
use crate::services::sections::SectionError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn forbidden(message: &str) -> Self {
        Self::Forbidden(message.to_string())
    }
}

impl From<MarksError> for ApiError {
    fn from(err: MarksError) -> Self {
        match err {
            MarksError::NotFound(message) => ApiError::NotFound(message),
            MarksError::Validation(message) => ApiError::BadRequest(message),
            MarksError::Forbidden(message) => ApiError::Forbidden(message),
            MarksError::Locked => ApiError::Conflict(MarksError::Locked.to_string()),
            MarksError::Store(err) => ApiError::internal(err, "Failed to save marks"),
        }
    }
}

impl From<SectionError> for ApiError {
    fn from(err: SectionError) -> Self {
        match err {
            SectionError::InvalidRange { .. } => ApiError::BadRequest(err.to_string()),
            SectionError::Overlap { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<LockError> for ApiError {
    fn from(err: LockError) -> Self {
        ApiError::Conflict(err.to_string())
    }
}

impl From<GroupError> for ApiError {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::NotFound => ApiError::NotFound(err.to_string()),
            GroupError::Store(err) => ApiError::internal(err, "Failed to load exam marks"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response = (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
        }
    }
}
