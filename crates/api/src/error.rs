use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid fix: {0}")]
    InvalidFix(String),

    #[error("Duplicate nonce")]
    DuplicateNonce,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::InvalidFix(msg) => (StatusCode::BAD_REQUEST, "invalid_fix", msg.clone()),
            ApiError::DuplicateNonce => (
                StatusCode::CONFLICT,
                "duplicate_nonce",
                "This location update has already been processed".into(),
            ),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::StoreUnavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "Position store is temporarily unavailable".into(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Flattens validator errors into one readable message.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    let parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |err| {
                format!("{}: {}", field, err.message.as_ref().unwrap_or(&"".into()))
            })
        })
        .collect();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_api_error_not_found() {
        let error = ApiError::NotFound("bus not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_error_invalid_fix() {
        let error = ApiError::InvalidFix("latitude out of range".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_duplicate_nonce() {
        let error = ApiError::DuplicateNonce;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_api_error_rate_limited() {
        let error = ApiError::RateLimited;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_api_error_store_unavailable() {
        let error = ApiError::StoreUnavailable("connection refused".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_api_error_internal() {
        let error = ApiError::Internal("unexpected".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::InvalidFix("test".to_string())),
            "Invalid fix: test"
        );
        assert_eq!(format!("{}", ApiError::DuplicateNonce), "Duplicate nonce");
        assert_eq!(format!("{}", ApiError::RateLimited), "Rate limited");
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        match error {
            ApiError::NotFound(msg) => assert_eq!(msg, "Resource not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_validation_message_flattening() {
        #[derive(Validate)]
        struct Probe {
            #[validate(custom(function = "shared::validation::validate_latitude"))]
            latitude: f64,
        }

        let probe = Probe { latitude: 120.0 };
        let errors = probe.validate().unwrap_err();
        let message = validation_message(&errors);
        assert!(message.contains("latitude"));
        assert!(message.contains("between -90 and 90"));
    }
}
