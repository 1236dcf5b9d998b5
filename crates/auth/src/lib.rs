//! Session authentication for realtime connections and HTTP requests.
//!
//! A client proves its identity with a signed access token, normally carried in
//! the `accessToken` cookie. The token's subject is resolved against the user
//! store before the connection is admitted.

mod cookie;
mod token;

use std::sync::Arc;

use skillswap_config::AuthConfig;
use skillswap_realtime::{StoreError, UserId, UserProfile, UserStore};
use thiserror::Error;
use tracing::debug;

pub use cookie::find_cookie;
pub use token::{AccessTokenCodec, Claims};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no cookies provided")]
    MissingCookies,
    #[error("token not provided")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    TokenExpired,
    #[error("user not found")]
    UserNotFound,
    #[error("token creation failed: {0}")]
    TokenCreation(String),
    #[error("user lookup failed: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Whether the failure lies with the presented credential rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::TokenCreation(_) | AuthError::Store(_))
    }
}

/// Verifies access tokens and resolves them to user profiles.
#[derive(Clone)]
pub struct SessionAuthenticator {
    codec: Arc<AccessTokenCodec>,
    users: Arc<dyn UserStore>,
    cookie_name: String,
}

impl SessionAuthenticator {
    pub fn new(config: &AuthConfig, users: Arc<dyn UserStore>) -> Self {
        Self {
            codec: Arc::new(AccessTokenCodec::from_config(config)),
            users,
            cookie_name: config.cookie_name.clone(),
        }
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Authenticate from a raw `Cookie` header.
    pub async fn authenticate_cookie_header(
        &self,
        header: Option<&str>,
    ) -> Result<UserProfile, AuthError> {
        let header = header
            .filter(|value| !value.trim().is_empty())
            .ok_or(AuthError::MissingCookies)?;
        let token = find_cookie(header, &self.cookie_name).ok_or(AuthError::MissingToken)?;
        self.authenticate_token(&token).await
    }

    /// Verify `token` and load the user it names.
    pub async fn authenticate_token(&self, token: &str) -> Result<UserProfile, AuthError> {
        let claims = self.codec.verify(token)?;
        let user_id = UserId::parse(&claims.id)
            .map_err(|_| AuthError::InvalidToken("malformed subject".to_string()))?;

        match self.users.find_user(&user_id).await? {
            Some(profile) => {
                debug!(user = %profile.id, "access token accepted");
                Ok(profile)
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}
