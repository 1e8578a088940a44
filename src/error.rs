// Gateway error types
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::AuthError;

/// Locally generated request failures. Every variant is terminal for the request.
#[derive(Debug, Error)]
pub enum GatewayError {
    // 400 Bad Request
    #[error("Unsupported language '{value}'")]
    InvalidLanguage { value: String, supported: Vec<String> },

    // 401 Unauthorized
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Invalid or expired token")]
    InvalidUserToken(#[source] AuthError),

    #[error("Invalid service token")]
    InvalidServiceToken { service: String },

    // 404 Not Found
    #[error("route not found")]
    NoRouteFound { method: String, path: String },

    // 502 Bad Gateway
    #[error("upstream service '{service}' is unavailable")]
    UpstreamUnavailable { service: String, reason: String },

    // 504 Gateway Timeout
    #[error("upstream service '{service}' did not respond in time")]
    UpstreamTimeout { service: String },

    // 500 Internal Server Error
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidLanguage { .. } => StatusCode::BAD_REQUEST,
            GatewayError::MissingCredential => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidUserToken(_) => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidServiceToken { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::NoRouteFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::InvalidLanguage { .. } => "INVALID_LANGUAGE",
            GatewayError::MissingCredential => "MISSING_CREDENTIAL",
            GatewayError::InvalidUserToken(_) => "INVALID_TOKEN",
            GatewayError::InvalidServiceToken { .. } => "INVALID_SERVICE_TOKEN",
            GatewayError::NoRouteFound { .. } => "NO_ROUTE_FOUND",
            GatewayError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            GatewayError::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get client-safe error message.
    ///
    /// Token failures collapse to one message; the specific `AuthError`
    /// is only visible in logs.
    pub fn message(&self) -> String {
        match self {
            GatewayError::InvalidLanguage { value, supported } => format!(
                "Unsupported language '{}'. Supported languages: {}",
                value,
                supported.join(", ")
            ),
            GatewayError::Internal(_) => "An error occurred while processing your request".to_string(),
            other => other.to_string(),
        }
    }

    /// True for the 401 rejections produced by auth classification
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::MissingCredential
                | GatewayError::InvalidUserToken(_)
                | GatewayError::InvalidServiceToken { .. }
        )
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            GatewayError::InvalidLanguage { supported, .. } => json!({
                "error": self.error_code(),
                "message": self.message(),
                "supported_languages": supported,
            }),
            _ => json!({
                "error": self.error_code(),
                "message": self.message(),
            }),
        }
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Internal(detail) = &self {
            tracing::error!("Internal gateway error: {}", detail);
        }

        let status = self.status_code();
        let mut response = (status, Json(self.to_json())).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert("www-authenticate", HeaderValue::from_static("Bearer"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_has_error_and_message() {
        let err = GatewayError::NoRouteFound {
            method: "GET".into(),
            path: "/api/unknown-path".into(),
        };
        let body = err.to_json();
        assert_eq!(body["error"], "NO_ROUTE_FOUND");
        assert_eq!(body["message"], "route not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn token_failures_share_one_message() {
        let expired = GatewayError::InvalidUserToken(AuthError::TokenExpired);
        let forged = GatewayError::InvalidUserToken(AuthError::TokenInvalidSignature);
        let garbage = GatewayError::InvalidUserToken(AuthError::TokenMalformed("bad base64".into()));

        assert_eq!(expired.message(), "Invalid or expired token");
        assert_eq!(expired.message(), forged.message());
        assert_eq!(forged.message(), garbage.message());
        assert_eq!(expired.to_json()["error"], "INVALID_TOKEN");
    }

    #[test]
    fn invalid_language_lists_supported_values() {
        let err = GatewayError::InvalidLanguage {
            value: "xx".into(),
            supported: vec!["en".into(), "hi".into(), "ta".into(), "gu".into()],
        };
        let body = err.to_json();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body["supported_languages"], json!(["en", "hi", "ta", "gu"]));
        assert!(body["message"].as_str().unwrap().contains("en, hi, ta, gu"));
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = GatewayError::Internal("pipeline reached dispatch unclassified".into());
        assert_eq!(err.to_json()["message"], "An error occurred while processing your request");
    }

    #[test]
    fn upstream_failures_map_to_gateway_statuses() {
        let down = GatewayError::UpstreamUnavailable {
            service: "exam".into(),
            reason: "connection refused".into(),
        };
        let slow = GatewayError::UpstreamTimeout { service: "exam".into() };
        assert_eq!(down.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(slow.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(!down.message().contains("connection refused"));
    }
}
