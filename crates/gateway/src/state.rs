//! Shared application state for the gateway

use std::sync::Arc;

use skillswap_auth::SessionAuthenticator;
use skillswap_config::AppConfig;
use skillswap_database::Repositories;
use skillswap_jobs::JobQueue;
use skillswap_realtime::{ChatPipeline, ConnectionManager, SessionOptions};

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    /// Database repositories
    pub repos: Repositories,
    /// Cookie/bearer token verification
    pub authenticator: SessionAuthenticator,
    /// Live connections and their rooms
    pub connections: Arc<ConnectionManager>,
    /// Chat send path shared by every socket session
    pub pipeline: Arc<ChatPipeline>,
    /// Background job producer
    pub jobs: JobQueue,
    pub session_options: SessionOptions,
    /// Shared secret expected on `/internal` callbacks
    pub internal_token: Option<String>,
    /// Allowed browser origin
    pub cors_origin: Option<String>,
}

impl GatewayState {
    /// Wire the gateway over already-initialised services.
    pub fn new(
        config: &AppConfig,
        repos: Repositories,
        connections: Arc<ConnectionManager>,
        jobs: JobQueue,
    ) -> Self {
        let authenticator =
            SessionAuthenticator::new(&config.auth, Arc::new(repos.users.clone()));
        let pipeline = Arc::new(ChatPipeline::new(
            Arc::new(repos.exchanges.clone()),
            Arc::new(repos.messages.clone()),
            connections.clone(),
        ));

        Self {
            repos,
            authenticator,
            connections,
            pipeline,
            jobs,
            session_options: SessionOptions {
                authorize_joins: config.realtime.authorize_joins,
            },
            internal_token: config
                .http
                .internal_token
                .clone()
                .filter(|token| !token.is_empty()),
            cors_origin: config.http.cors_origin.clone(),
        }
    }
}
