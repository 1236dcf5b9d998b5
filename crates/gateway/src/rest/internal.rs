//! Result callbacks from the transcription and review-analysis services.
//!
//! Mounted under `/internal` behind the shared-token check.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use skillswap_jobs::Job;
use skillswap_realtime::UserId;

use crate::error::{GatewayError, GatewayResult};
use crate::response::ApiResponse;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct TranscriptCallback {
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewSummaryCallback {
    pub positive: String,
    pub negative: String,
}

pub fn create_internal_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/recordings/:recording_id/transcript", post(transcript_finished))
        .route("/users/:user_id/review-summary", post(review_summary_ready))
}

pub async fn transcript_finished(
    State(state): State<Arc<GatewayState>>,
    Path(recording_id): Path<String>,
    Json(callback): Json<TranscriptCallback>,
) -> GatewayResult<ApiResponse<Value>> {
    enqueue(
        &state,
        Job::TranscriptionFinished {
            recording_id,
            transcript: callback.transcript,
        },
    )
}

pub async fn review_summary_ready(
    State(state): State<Arc<GatewayState>>,
    Path(user_id): Path<String>,
    Json(callback): Json<ReviewSummaryCallback>,
) -> GatewayResult<ApiResponse<Value>> {
    let user_id = UserId::parse(&user_id)
        .map_err(|_| GatewayError::InvalidRequest("Invalid user ID.".to_string()))?;

    enqueue(
        &state,
        Job::ReviewSummaryReady {
            user_id,
            positive: callback.positive,
            negative: callback.negative,
        },
    )
}

fn enqueue(state: &GatewayState, job: Job) -> GatewayResult<ApiResponse<Value>> {
    if !state.jobs.submit(job) {
        return Err(GatewayError::ServiceUnavailable);
    }
    Ok(ApiResponse::new(StatusCode::ACCEPTED, json!({}), "Accepted for processing."))
}
