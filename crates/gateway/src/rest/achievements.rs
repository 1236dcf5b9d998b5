use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use skillswap_database::Achievement;

use crate::error::GatewayResult;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::state::GatewayState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedAchievement {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub awarded_at: DateTime<Utc>,
}

pub fn create_achievement_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/api/achievements/me", get(my_achievements))
}

pub async fn my_achievements(
    State(state): State<Arc<GatewayState>>,
    AuthUser(user): AuthUser,
) -> GatewayResult<ApiResponse<Vec<EarnedAchievement>>> {
    let earned = state
        .repos
        .achievements
        .list_for_user(&user.id)
        .await?
        .into_iter()
        .map(|(achievement, awarded_at)| EarnedAchievement {
            achievement,
            awarded_at,
        })
        .collect();

    Ok(ApiResponse::ok(
        earned,
        "User achievements retrieved successfully.",
    ))
}
