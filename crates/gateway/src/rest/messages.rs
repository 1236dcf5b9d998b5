//! Chat history endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use skillswap_realtime::MessageView;

use super::{find_exchange, parse_exchange_id};
use crate::error::{GatewayError, GatewayResult};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::state::GatewayState;

pub fn create_message_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/api/exchanges/:exchange_id/messages", get(list_messages))
}

/// Full history of an exchange, oldest first. Participants only.
pub async fn list_messages(
    State(state): State<Arc<GatewayState>>,
    AuthUser(user): AuthUser,
    Path(exchange_id): Path<String>,
) -> GatewayResult<ApiResponse<Vec<MessageView>>> {
    let exchange_id = parse_exchange_id(&exchange_id)?;
    let exchange = find_exchange(&state, &exchange_id).await?;

    if !exchange.is_participant(&user.id) {
        return Err(GatewayError::AuthorizationFailed(
            "You are not authorized to view these messages.".to_string(),
        ));
    }

    let messages = state.repos.messages.history(&exchange.id).await?;
    Ok(ApiResponse::ok(
        messages,
        "Message history retrieved successfully.",
    ))
}
