//! # Web API Error Types
//!
//! Error types specific to the web API and their HTTP response
//! conversions. Uses thiserror for structure and Axum's `IntoResponse`
//! for the HTTP mapping; all error bodies follow the
//! `{"error": {"code", "message"}}` shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::StackforgeError;

/// Web API specific errors with HTTP status code mappings.
#[derive(Error, Debug, ToSchema)]
pub enum ApiError {
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    /// Too many requests; includes a Retry-After header
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    #[error("Database operation failed: {operation}")]
    DatabaseError { operation: String },

    /// Upstream dependency failure (LLM provider or artifact store)
    #[error("Upstream failure: {message}")]
    Upstream { message: String },

    #[error("Invalid UUID format: {uuid}")]
    InvalidUuid { uuid: String },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Create a NotFound error with a custom message
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a BadRequest error with a custom message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a DatabaseError with operation context
    pub fn database_error(operation: impl Into<String>) -> Self {
        Self::DatabaseError {
            operation: operation.into(),
        }
    }

    /// Create an Upstream error for failed LLM or storage calls
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create an InvalidUuid error
    pub fn invalid_uuid(uuid: impl Into<String>) -> Self {
        Self::InvalidUuid { uuid: uuid.into() }
    }

    /// Create a RateLimited error with a retry hint
    pub fn rate_limited(retry_after_seconds: u64) -> Self {
        Self::RateLimited {
            retry_after_seconds,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Rate limiting carries a Retry-After header alongside the body
        if let ApiError::RateLimited {
            retry_after_seconds,
        } = &self
        {
            let error_response = json!({
                "error": {
                    "code": "RATE_LIMITED",
                    "message": "Rate limit exceeded",
                    "retry_after_seconds": retry_after_seconds
                }
            });

            return (
                StatusCode::TOO_MANY_REQUESTS,
                [(
                    axum::http::header::RETRY_AFTER,
                    retry_after_seconds.to_string(),
                )],
                Json(error_response),
            )
                .into_response();
        }

        let (status_code, error_code, message) = match &self {
            ApiError::NotFound { message } => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", message.as_str())
            }

            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required",
            ),

            ApiError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.as_str())
            }

            // Unreachable due to the early return above; kept for an
            // exhaustive match
            ApiError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Rate limit exceeded",
            ),

            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable",
            ),

            ApiError::DatabaseError { operation } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                operation.as_str(),
            ),

            ApiError::Upstream { message } => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message.as_str())
            }

            ApiError::InvalidUuid { uuid } => {
                (StatusCode::BAD_REQUEST, "INVALID_UUID", uuid.as_str())
            }

            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        };

        let error_response = json!({
            "error": {
                "code": error_code,
                "message": message
            }
        });

        (status_code, Json(error_response)).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Database record not found"),
            sqlx::Error::PoolTimedOut => ApiError::ServiceUnavailable,
            _ => ApiError::database_error("Database operation failed"),
        }
    }
}

/// Convert UUID parse errors to API errors
impl From<uuid::Error> for ApiError {
    fn from(_: uuid::Error) -> Self {
        ApiError::invalid_uuid("Invalid UUID format")
    }
}

/// Convert service-layer errors to API errors
impl From<StackforgeError> for ApiError {
    fn from(err: StackforgeError) -> Self {
        match err {
            StackforgeError::ValidationError(message) => ApiError::bad_request(message),
            StackforgeError::DatabaseError(_) => {
                ApiError::database_error("Database operation failed")
            }
            StackforgeError::LlmError(message) => {
                ApiError::upstream(format!("scaffold synthesis failed: {message}"))
            }
            StackforgeError::StorageError(message) => {
                ApiError::upstream(format!("artifact storage failed: {message}"))
            }
            StackforgeError::ArchiveError(_) | StackforgeError::ConfigurationError(_) => {
                ApiError::Internal
            }
        }
    }
}

/// Result type alias for web API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_response_carries_retry_after() {
        let response = ApiError::rate_limited(42).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let retry_after = response
            .headers()
            .get(axum::http::header::RETRY_AFTER)
            .expect("Retry-After header present");
        assert_eq!(retry_after.to_str().unwrap(), "42");
    }

    #[test]
    fn test_status_code_mappings() {
        assert_eq!(
            ApiError::not_found("x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::bad_request("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::upstream("x").into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_llm_failure_maps_to_bad_gateway() {
        let api_error: ApiError =
            StackforgeError::LlmError("provider returned 500".to_string()).into();
        assert_eq!(
            api_error.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_validation_failure_maps_to_bad_request() {
        let api_error: ApiError =
            StackforgeError::ValidationError("prompt cannot be empty".to_string()).into();
        assert_eq!(api_error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let api_error: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(api_error.into_response().status(), StatusCode::NOT_FOUND);
    }
}
