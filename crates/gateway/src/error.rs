//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skillswap_auth::AuthError;
use skillswap_database::DatabaseError;
use skillswap_realtime::RealtimeError;
use thiserror::Error;
use tracing::error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    AuthenticationFailed(String),

    #[error("{0}")]
    AuthorizationFailed(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Text returned to the client. Server-side details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                "Something went wrong.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = json!({
            "statusCode": status.as_u16(),
            "message": self.public_message(),
            "success": false,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<DatabaseError> for GatewayError {
    fn from(error: DatabaseError) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingCookies | AuthError::MissingToken => {
                GatewayError::AuthenticationFailed("Unauthorized request".to_string())
            }
            AuthError::TokenCreation(_) | AuthError::Store(_) => {
                GatewayError::InternalError(error.to_string())
            }
            _ => GatewayError::AuthenticationFailed("Invalid access token".to_string()),
        }
    }
}

impl From<RealtimeError> for GatewayError {
    fn from(error: RealtimeError) -> Self {
        match error {
            RealtimeError::Validation(message) => GatewayError::InvalidRequest(message),
            RealtimeError::NotFound(_) => GatewayError::NotFound(error.client_message()),
            RealtimeError::Authorization(message) => GatewayError::AuthorizationFailed(message),
            RealtimeError::Persistence(detail) => GatewayError::DatabaseError(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_unauthorized() {
        let missing = GatewayError::from(AuthError::MissingToken);
        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.public_message(), "Unauthorized request");

        let expired = GatewayError::from(AuthError::TokenExpired);
        assert_eq!(expired.public_message(), "Invalid access token");
    }

    #[test]
    fn server_errors_hide_details() {
        let error = GatewayError::DatabaseError("disk I/O error".to_string());
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.public_message(), "Something went wrong.");
    }

    #[test]
    fn realtime_errors_keep_their_category() {
        let not_found = GatewayError::from(RealtimeError::NotFound("exchange"));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.public_message(), "Exchange not found.");

        let forbidden = GatewayError::from(RealtimeError::Authorization("nope".to_string()));
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
    }
}
