//! Exchange lifecycle endpoints that feed the background jobs.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;
use skillswap_database::{Exchange, ReviewSide};
use skillswap_jobs::Job;
use skillswap_realtime::{ExchangeStatus, UserId};
use tracing::info;

use super::{find_exchange, parse_exchange_id};
use crate::error::{GatewayError, GatewayResult};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub review: Option<String>,
}

pub fn create_exchange_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/exchanges/:exchange_id/status", patch(update_status))
        .route("/api/exchanges/:exchange_id/review", post(submit_review))
}

pub async fn update_status(
    State(state): State<Arc<GatewayState>>,
    AuthUser(user): AuthUser,
    Path(exchange_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> GatewayResult<ApiResponse<Exchange>> {
    let exchange_id = parse_exchange_id(&exchange_id)?;
    let next = requested_status(&request.status)?;
    let exchange = find_exchange(&state, &exchange_id).await?;

    check_transition(&exchange, &user.id, next)?;
    state.repos.exchanges.update_status(&exchange.id, next).await?;
    info!(exchange_id = %exchange.id, user_id = %user.id, status = %next, "exchange status changed");

    match next {
        ExchangeStatus::Completed => {
            for participant in [&exchange.initiator, &exchange.receiver] {
                state.jobs.submit(Job::ExchangeCompleted {
                    user_id: participant.clone(),
                });
            }
        }
        ExchangeStatus::Accepted => {
            state.jobs.submit(Job::CreateNotification {
                user_id: exchange.initiator.clone(),
                message: format!("{} accepted your exchange request.", user.full_name),
                link: format!("/exchange/{}", exchange.id),
            });
        }
        _ => {}
    }

    let updated = find_exchange(&state, &exchange.id).await?;
    Ok(ApiResponse::ok(updated, format!("Exchange has been {next}.")))
}

fn requested_status(raw: &str) -> GatewayResult<ExchangeStatus> {
    match raw {
        "accepted" => Ok(ExchangeStatus::Accepted),
        "rejected" => Ok(ExchangeStatus::Rejected),
        "completed" => Ok(ExchangeStatus::Completed),
        "cancelled" => Ok(ExchangeStatus::Cancelled),
        _ => Err(GatewayError::InvalidRequest("Invalid status.".to_string())),
    }
}

fn check_transition(exchange: &Exchange, user: &UserId, next: ExchangeStatus) -> GatewayResult<()> {
    let is_initiator = &exchange.initiator == user;
    let is_participant = exchange.is_participant(user);
    let forbidden = |message: &str| Err(GatewayError::AuthorizationFailed(message.to_string()));

    match next {
        ExchangeStatus::Accepted | ExchangeStatus::Rejected => {
            if exchange.status != ExchangeStatus::Pending || &exchange.receiver != user {
                return forbidden("You are not authorized to perform this action.");
            }
        }
        ExchangeStatus::Completed => {
            if exchange.status != ExchangeStatus::Accepted {
                return Err(GatewayError::InvalidRequest(
                    "Only an accepted exchange can be marked as completed.".to_string(),
                ));
            }
            if !is_participant {
                return forbidden("Only a participant can mark this as completed.");
            }
        }
        ExchangeStatus::Cancelled => match exchange.status {
            ExchangeStatus::Pending if !is_initiator => {
                return forbidden("Only the initiator can cancel a pending request.");
            }
            ExchangeStatus::Accepted if !is_participant => {
                return forbidden("Only participants can cancel an active exchange.");
            }
            ExchangeStatus::Pending | ExchangeStatus::Accepted => {}
            _ => {
                return Err(GatewayError::InvalidRequest(
                    "Only a pending or accepted exchange can be cancelled.".to_string(),
                ));
            }
        },
        ExchangeStatus::Pending => {
            return Err(GatewayError::InvalidRequest("Invalid status.".to_string()));
        }
    }
    Ok(())
}

pub async fn submit_review(
    State(state): State<Arc<GatewayState>>,
    AuthUser(user): AuthUser,
    Path(exchange_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> GatewayResult<ApiResponse<Exchange>> {
    let exchange_id = parse_exchange_id(&exchange_id)?;
    let rating = request
        .rating
        .filter(|rating| (1..=5).contains(rating))
        .ok_or_else(|| GatewayError::InvalidRequest("A rating between 1 and 5 is required.".to_string()))?;

    let exchange = find_exchange(&state, &exchange_id).await?;
    if exchange.status != ExchangeStatus::Completed {
        return Err(GatewayError::InvalidRequest(
            "Can only review completed exchanges.".to_string(),
        ));
    }

    // The reviewer rates the other participant for the topic that participant taught.
    let (side, rated, taught_topic) = if exchange.initiator == user.id {
        (ReviewSide::Initiator, &exchange.receiver, &exchange.topic_to_learn)
    } else if exchange.receiver == user.id {
        (ReviewSide::Receiver, &exchange.initiator, &exchange.topic_to_teach)
    } else {
        return Err(GatewayError::AuthorizationFailed(
            "You are not part of this exchange.".to_string(),
        ));
    };

    let review = request
        .review
        .as_deref()
        .map(str::trim)
        .filter(|review| !review.is_empty());
    let recorded = state
        .repos
        .exchanges
        .record_review(&exchange.id, side, rating, review)
        .await?;
    if !recorded {
        return Err(GatewayError::InvalidRequest(
            "You have already reviewed this exchange.".to_string(),
        ));
    }

    state.jobs.submit(Job::SkillReviewed {
        user_id: rated.clone(),
        topic_id: taught_topic.clone(),
    });

    let updated = find_exchange(&state, &exchange.id).await?;
    Ok(ApiResponse::ok(updated, "Review submitted successfully."))
}
