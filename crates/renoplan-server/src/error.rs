//! HTTP mapping of core errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use renoplan_core::{RelayError, RenoplanError};
use renoplan_types::ErrorBody;

/// Error returned by route handlers; renders as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub RenoplanError);

impl From<RenoplanError> for ApiError {
    fn from(e: RenoplanError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError(RenoplanError::InvalidInput(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError(RenoplanError::Forbidden(message.into()))
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0 {
            RenoplanError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            RenoplanError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message.clone()),
            RenoplanError::Forbidden(message) => (StatusCode::FORBIDDEN, message.clone()),
            RenoplanError::Upstream { status, message } => {
                relay_response(&RelayError::from_status(*status, message))
            }
            RenoplanError::Relay(e) => relay_response(e),
            RenoplanError::ScrapeFailed { .. }
            | RenoplanError::MalformedResponse(_)
            | RenoplanError::HttpError(_) => {
                (StatusCode::BAD_GATEWAY, self.0.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        }
    }
}

/// Rate limit, payment and bad request keep their status; anything else
/// from upstream is a bad gateway.
fn relay_response(e: &RelayError) -> (StatusCode, String) {
    let status = e
        .status_code()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    (status, e.notice())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(target: "renoplan::api", "Request failed: {}", self.0);
        } else {
            tracing::debug!(target: "renoplan::api", "Request rejected ({}): {}", status, self.0);
        }
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(e: RenoplanError) -> (StatusCode, String) {
        ApiError(e).status_and_message()
    }

    #[test]
    fn test_client_errors() {
        let (status, _) = status_of(RenoplanError::not_found("Project", Uuid::nil()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(RenoplanError::InvalidInput("bad".into())),
            (StatusCode::BAD_REQUEST, "bad".to_string())
        );
        assert_eq!(status_of(RenoplanError::LockPoisoned).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_statuses_pass_through() {
        let upstream = |status: u16, message: &str| RenoplanError::Upstream {
            status,
            message: message.to_string(),
        };

        assert_eq!(status_of(upstream(429, "")).0, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_of(upstream(402, "")).0, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            status_of(upstream(400, r#"{"error":"Unsupported image"}"#)),
            (StatusCode::BAD_REQUEST, "Unsupported image".to_string())
        );
        assert_eq!(status_of(upstream(503, "down")).0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_scraper_failures_are_bad_gateway() {
        for status in [400, 402, 429, 500] {
            let (code, message) = status_of(RenoplanError::ScrapeFailed {
                status,
                message: "blocked".into(),
            });
            assert_eq!(code, StatusCode::BAD_GATEWAY);
            assert_ne!(message, RelayError::PaymentRequired.notice());
            assert_ne!(message, RelayError::RateLimited.notice());
        }
    }

    #[test]
    fn test_relay_error_notice() {
        let (status, message) = status_of(RenoplanError::Relay(RelayError::RateLimited));
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(message, RelayError::RateLimited.notice());
    }
}
