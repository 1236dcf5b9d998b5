//! # SkillSwap Gateway Crate
//!
//! HTTP and websocket entry points of the realtime backend.
//!
//! - **WebSocket**: `/ws`, authenticated from the session cookie before upgrade
//! - **REST**: chat history, notifications, achievements and exchange lifecycle
//! - **Internal**: result callbacks from external services, behind a shared token
//! - **Middleware**: request authentication, CORS and request logging

pub mod error;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use middleware::{AuthUser, INTERNAL_TOKEN_HEADER};
pub use response::ApiResponse;
pub use state::GatewayState;

use std::sync::Arc;

use axum::{middleware as axum_middleware, Router};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let cors = middleware::cors_layer(state.cors_origin.as_deref());
    let state = Arc::new(state);

    Router::new()
        .merge(rest::create_rest_routes(state.clone()))
        .merge(websocket::create_websocket_routes())
        .with_state(state)
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
