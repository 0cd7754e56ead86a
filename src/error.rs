//! Error Types
//!
//! Two layers of errors:
//!
//! - [`ConfigError`] is raised once, at startup, when the session configuration
//!   is unusable (missing or short secret, unparsable values).
//! - [`AuthError`] is the request-level rejection. It converts into an HTTP
//!   response with a JSON body and never echoes internal detail to the client.
//!
//! ```ignore
//! use vestibule::{AuthError, CurrentSession};
//!
//! async fn orders(session: CurrentSession) -> Result<Json<Vec<Order>>, AuthError> {
//!     let orders = db.orders_for(&session.user.id)
//!         .await
//!         .map_err(|e| AuthError::internal(e))?;
//!     Ok(Json(orders))
//! }
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::secret::SecretError;
use crate::session::SessionError;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Startup configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The signing secret is missing or too short
    #[error("invalid session secret: {0}")]
    Secret(#[from] SecretError),

    /// An environment variable holds a value that does not parse
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidValue {
            key,
            value: value.into(),
            reason,
        }
    }
}

// ============================================================================
// Request Errors
// ============================================================================

/// Request-level authentication and throttling failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No valid session accompanies the request
    #[error("authentication required")]
    Unauthenticated,

    /// The session is valid but lacks the required role
    #[error("access denied")]
    Forbidden,

    /// Too many attempts; retry after the given number of seconds
    #[error("too many requests, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Anything else. The message is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Wrap an unexpected failure
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::RateLimited { .. } => "rate_limit_exceeded",
            Self::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Authentication required".to_string(),
            Self::Forbidden => "Access denied".to_string(),
            Self::RateLimited { retry_after_secs } => format!(
                "Too many attempts. Please retry after {} seconds.",
                retry_after_secs
            ),
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        Self::internal(err)
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "Request failed with internal error");
        }

        let retry_after_secs = match self {
            Self::RateLimited { retry_after_secs } => Some(retry_after_secs),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.code(),
            message: self.public_message(),
            retry_after_secs,
        };

        let mut response = (self.status_code(), Json(body)).into_response();
        if let Some(secs) = retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::RateLimited { retry_after_secs: 3 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::internal("db down").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let response = AuthError::RateLimited { retry_after_secs: 42 }.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");

        let body = body_json(response).await;
        assert_eq!(body["error"], "rate_limit_exceeded");
        assert_eq!(body["retry_after_secs"], 42);
    }

    #[tokio::test]
    async fn test_internal_detail_not_exposed() {
        let response = AuthError::internal("connection refused: 10.0.0.5:5432").into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("10.0.0.5"));
        assert!(body.get("retry_after_secs").is_none());
    }

    #[tokio::test]
    async fn test_unauthenticated_body() {
        let body = body_json(AuthError::Unauthenticated.into_response()).await;
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["message"], "Authentication required");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("SESSION_MAX_AGE", "soon", "expected a duration like 24h");
        assert_eq!(
            err.to_string(),
            "invalid value for SESSION_MAX_AGE: \"soon\" (expected a duration like 24h)"
        );

        let err = ConfigError::from(SecretError::Missing);
        assert!(err.to_string().starts_with("invalid session secret"));
    }
}
