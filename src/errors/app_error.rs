use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// Error codes for structured error responses
pub mod error_codes {
    pub const SIGNATURE_REJECTED: &str = "signature_rejected";
    pub const INVALID_PAYLOAD: &str = "invalid_payload";
    pub const TENANT_NOT_FOUND: &str = "tenant_not_found_for_number";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A single field-level validation failure, returned to the caller verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `caller_input.text`
    pub field: String,
    /// Human-readable description of the violation
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error taxonomy.
///
/// Authentication and payload errors are terminal at the ingress boundary;
/// routing misses are expected outcomes, not faults; provider degradation is
/// absorbed by the fallback paths and never appears here. Internal faults
/// carry a diagnostic for the log only - the response body stays generic and
/// never includes caller utterance text.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Webhook signature missing, stale, or cryptographically invalid
    #[error("webhook signature verification failed")]
    AuthenticationFailure,

    /// Provider envelope could not be parsed
    #[error("unparsable call event payload: {0}")]
    PayloadError(String),

    /// No active tenant routing exists for the dialed number
    #[error("no active tenant routing for number")]
    RoutingMiss,

    /// Request body violated the schema; details are field-level
    #[error("request validation failed")]
    ValidationFailure(Vec<FieldError>),

    /// Unhandled internal fault
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the stable error code for structured error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::AuthenticationFailure => error_codes::SIGNATURE_REJECTED,
            AppError::PayloadError(_) => error_codes::INVALID_PAYLOAD,
            AppError::RoutingMiss => error_codes::TENANT_NOT_FOUND,
            AppError::ValidationFailure(_) => error_codes::VALIDATION_FAILED,
            AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            AppError::PayloadError(_) => StatusCode::BAD_REQUEST,
            AppError::RoutingMiss => StatusCode::NOT_FOUND,
            AppError::ValidationFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the error at the appropriate level.
    ///
    /// Severity mapping:
    /// - `warn`: AuthenticationFailure (no caller content), PayloadError
    ///   (size-bounded diagnostic only)
    /// - `info`: RoutingMiss (expected outcome for unmapped numbers)
    /// - `debug`: ValidationFailure (caller gets the full detail anyway)
    /// - `error`: Internal
    pub fn log(&self) {
        match self {
            AppError::AuthenticationFailure => {
                tracing::warn!(error_code = self.error_code(), "{}", self);
            }
            AppError::PayloadError(diag) => {
                tracing::warn!(
                    error_code = self.error_code(),
                    diagnostic = %truncate(diag, 200),
                    "unparsable call event payload"
                );
            }
            AppError::RoutingMiss => {
                tracing::info!(error_code = self.error_code(), "{}", self);
            }
            AppError::ValidationFailure(details) => {
                tracing::debug!(
                    error_code = self.error_code(),
                    field_count = details.len(),
                    "request validation failed"
                );
            }
            AppError::Internal(msg) => {
                tracing::error!(error_code = self.error_code(), "internal error: {}", msg);
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let body = match &self {
            AppError::ValidationFailure(details) => Json(json!({
                "error": self.error_code(),
                "details": details,
            })),
            // Generic bodies: the error code is the whole story. Internal
            // faults deliberately leak nothing beyond the stable code.
            _ => Json(json!({
                "error": self.error_code(),
            })),
        };

        (status, body).into_response()
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::AuthenticationFailure.error_code(),
            error_codes::SIGNATURE_REJECTED
        );
        assert_eq!(
            AppError::RoutingMiss.error_code(),
            error_codes::TENANT_NOT_FOUND
        );
        assert_eq!(
            AppError::ValidationFailure(vec![]).error_code(),
            error_codes::VALIDATION_FAILED
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::AuthenticationFailure.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::PayloadError("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::RoutingMiss.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::ValidationFailure(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_routing_miss_body() {
        use http_body_util::BodyExt;

        let response = AppError::RoutingMiss.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body_json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body_json["error"], "tenant_not_found_for_number");
    }

    #[tokio::test]
    async fn test_validation_failure_carries_field_details() {
        use http_body_util::BodyExt;

        let error = AppError::ValidationFailure(vec![
            FieldError::new("text", "must not be empty"),
            FieldError::new("audio.sample_rate_hz", "must be positive"),
        ]);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body_json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body_json["error"], "validation_failed");
        assert_eq!(body_json["details"].as_array().unwrap().len(), 2);
        assert_eq!(body_json["details"][0]["field"], "text");
        assert_eq!(body_json["details"][1]["message"], "must be positive");
    }

    #[tokio::test]
    async fn test_internal_error_body_is_generic() {
        use http_body_util::BodyExt;

        let response = AppError::Internal("secret diagnostic".to_string()).into_response();
        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body_str = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body_str.contains("secret diagnostic"));
        assert!(body_str.contains("internal_error"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
    }
}
