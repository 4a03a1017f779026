/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts to
/// appropriate HTTP status codes.
///
/// Missing entities and entities the caller may not touch both become
/// [`ApiError::NotFound`], so responses never reveal that a hidden task or
/// plan exists.
///
/// # Example
///
/// ```
/// use minitask_api::error::{ApiError, ApiResult};
///
/// fn find(id: i64) -> ApiResult<i64> {
///     if id > 0 {
///         Ok(id)
///     } else {
///         Err(ApiError::NotFound("Task not found".to_string()))
///     }
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use minitask_shared::auth::middleware::AuthError;
use minitask_shared::telegram::ProfileError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401), init data missing or invalid
    Unauthorized(String),

    /// Not found (404), also used for "not yours"
    NotFound(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Server misconfiguration (500), message is safe to expose
    Configuration(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    msg,
                    None,
                )
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // A plan or parent deleted between the visibility check and the write
                if db_err.is_foreign_key_violation() {
                    return ApiError::NotFound("Referenced resource not found".to_string());
                }
                if db_err.is_check_violation() {
                    return ApiError::BadRequest(format!("Constraint violation: {}", db_err));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::NotConfigured => {
                ApiError::Configuration("Server is missing BOT_TOKEN configuration".to_string())
            }
            AuthError::InvalidInitData(inner) => {
                tracing::debug!(error = %inner, "Init data rejected");
                ApiError::Unauthorized(format!("Invalid Telegram initData: {}", inner))
            }
        }
    }
}

/// Convert profile lookup errors to API errors
impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        if err.is_remote() {
            tracing::info!(error = %err, "Telegram profile lookup failed");
            ApiError::NotFound("Telegram user not found or not visible to the bot".to_string())
        } else {
            ApiError::InternalError(err.to_string())
        }
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minitask_shared::auth::init_data::InitDataError;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Title must not be empty"))]
        title: String,
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest(String::new()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
            (ApiError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (ApiError::ValidationError(vec![]), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::Configuration(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::InternalError(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthError::MissingCredentials),
            ApiError::Unauthorized(msg) if msg == "Telegram initData missing"
        ));
        assert!(matches!(
            ApiError::from(AuthError::NotConfigured),
            ApiError::Configuration(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::InvalidInitData(InitDataError::Expired)),
            ApiError::Unauthorized(_)
        ));
    }

    #[test]
    fn test_profile_error_mapping() {
        let err = ApiError::from(ProfileError::InvalidIdentifier("a b".to_string()));
        assert!(matches!(err, ApiError::NotFound(_)));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert!(matches!(
            ApiError::from(ProfileError::Storage(io)),
            ApiError::InternalError(_)
        ));
    }

    #[test]
    fn test_validation_error() {
        let err: ApiError = Sample { title: String::new() }.validate().unwrap_err().into();

        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "title");
                assert_eq!(details[0].message, "Title must not be empty");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
