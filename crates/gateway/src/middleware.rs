//! Middleware for authentication and other cross-cutting concerns

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use skillswap_auth::{find_cookie, AuthError};
use skillswap_realtime::UserProfile;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::error::GatewayError;
use crate::state::GatewayState;

/// Header carrying the shared secret on service callbacks.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// The authenticated caller of an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

#[async_trait]
impl FromRequestParts<Arc<GatewayState>> for AuthUser {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState>,
    ) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers, state.authenticator.cookie_name())
            .ok_or(AuthError::MissingToken)?;
        let profile = state.authenticator.authenticate_token(&token).await?;
        Ok(AuthUser(profile))
    }
}

/// The access token from the session cookie, else from `Authorization: Bearer`.
fn request_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| find_cookie(cookies, cookie_name));

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Gate for `/internal` routes. Without a configured token the routes do not exist.
pub async fn require_internal_token(
    State(state): State<Arc<GatewayState>>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(expected) = state.internal_token.as_deref() else {
        return Err(GatewayError::NotFound("Not found.".to_string()));
    };

    let presented = request
        .headers()
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    let matches = presented.is_some_and(|token| tokens_match(token.as_bytes(), expected.as_bytes()));
    if !matches {
        return Err(GatewayError::AuthenticationFailed(
            "Invalid internal token".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// CORS for the browser client. Credentials are only allowed for a named origin.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::OPTIONS,
    ];

    match origin.and_then(|origin| HeaderValue::from_str(origin).ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods(methods)
            .allow_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    }
}
