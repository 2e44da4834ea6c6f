use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use fellowpet_services::ServiceError;
use fellowpet_services::dao::base::DaoError;
use fellowpet_services::payouts::PayoutError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
    PreconditionFailed(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid-argument", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthenticated", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "permission-denied", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not-found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "already-exists", msg),
            ApiError::Gone(msg) => (StatusCode::GONE, "deadline-exceeded", msg),
            ApiError::PreconditionFailed(msg) => {
                (StatusCode::PRECONDITION_FAILED, "failed-precondition", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
        };

        let body = ErrorResponse {
            error: error_code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err.code() {
            "invalid-argument" => ApiError::BadRequest(message),
            "unauthenticated" => ApiError::Unauthorized(message),
            "permission-denied" => ApiError::Forbidden(message),
            "not-found" => ApiError::NotFound(message),
            "already-exists" => ApiError::Conflict(message),
            "deadline-exceeded" => ApiError::Gone(message),
            "failed-precondition" => ApiError::PreconditionFailed(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl From<DaoError> for ApiError {
    fn from(err: DaoError) -> Self {
        ApiError::from(ServiceError::Dao(err))
    }
}

impl From<PayoutError> for ApiError {
    fn from(err: PayoutError) -> Self {
        match err {
            PayoutError::MissingParameters(msg) => ApiError::BadRequest(msg),
            PayoutError::InvalidSignature => {
                ApiError::Unauthorized("Invalid webhook signature".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
