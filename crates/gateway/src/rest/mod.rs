//! REST API endpoints for the gateway

pub mod achievements;
pub mod exchanges;
pub mod health;
pub mod internal;
pub mod messages;
pub mod notifications;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use skillswap_database::Exchange;
use skillswap_realtime::ExchangeId;

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::require_internal_token;
use crate::state::GatewayState;

/// Create all REST API routes
pub fn create_rest_routes(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    let internal = internal::create_internal_routes()
        .route_layer(from_fn_with_state(state, require_internal_token));

    Router::new()
        .merge(health::create_health_routes())
        .merge(messages::create_message_routes())
        .merge(notifications::create_notification_routes())
        .merge(achievements::create_achievement_routes())
        .merge(exchanges::create_exchange_routes())
        .nest("/internal", internal)
}

pub(crate) fn parse_exchange_id(raw: &str) -> GatewayResult<ExchangeId> {
    ExchangeId::parse(raw).map_err(|_| GatewayError::InvalidRequest("Invalid exchange ID.".to_string()))
}

pub(crate) async fn find_exchange(state: &GatewayState, id: &ExchangeId) -> GatewayResult<Exchange> {
    state
        .repos
        .exchanges
        .find_by_id(id)
        .await?
        .ok_or_else(|| GatewayError::NotFound("Exchange not found.".to_string()))
}
