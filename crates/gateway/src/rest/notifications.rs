use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use skillswap_database::{Notification, DEFAULT_NOTIFICATION_LIMIT};
use tracing::debug;

use crate::error::GatewayResult;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::state::GatewayState;

pub fn create_notification_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read", post(mark_all_read))
}

pub async fn list_notifications(
    State(state): State<Arc<GatewayState>>,
    AuthUser(user): AuthUser,
) -> GatewayResult<ApiResponse<Vec<Notification>>> {
    let notifications = state
        .repos
        .notifications
        .latest_for(&user.id, DEFAULT_NOTIFICATION_LIMIT)
        .await?;

    Ok(ApiResponse::ok(
        notifications,
        "Notifications retrieved successfully.",
    ))
}

pub async fn mark_all_read(
    State(state): State<Arc<GatewayState>>,
    AuthUser(user): AuthUser,
) -> GatewayResult<ApiResponse<Value>> {
    let updated = state.repos.notifications.mark_all_read(&user.id).await?;
    debug!(user_id = %user.id, updated, "notifications marked read");

    Ok(ApiResponse::ok(json!({}), "Notifications marked as read."))
}
