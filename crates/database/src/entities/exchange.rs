//! Exchange entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillswap_realtime::{ExchangeId, ExchangeRecord, ExchangeStatus, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    #[serde(rename = "_id")]
    pub id: ExchangeId,
    pub initiator: UserId,
    pub receiver: UserId,
    pub topic_to_learn: String,
    pub topic_to_teach: String,
    pub status: ExchangeStatus,
    pub initiator_rating: Option<i64>,
    pub initiator_review: Option<String>,
    pub receiver_rating: Option<i64>,
    pub receiver_review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exchange {
    pub fn record(&self) -> ExchangeRecord {
        ExchangeRecord {
            id: self.id.clone(),
            initiator: self.initiator.clone(),
            receiver: self.receiver.clone(),
            status: self.status,
        }
    }

    pub fn is_participant(&self, user: &UserId) -> bool {
        &self.initiator == user || &self.receiver == user
    }
}

/// Which participant wrote a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSide {
    Initiator,
    Receiver,
}

#[derive(Debug, Clone)]
pub struct NewExchange {
    pub initiator: UserId,
    pub receiver: UserId,
    /// Topic the initiator wants to learn; the receiver teaches it.
    pub topic_to_learn: String,
    /// Topic the initiator teaches in return.
    pub topic_to_teach: String,
    pub status: ExchangeStatus,
}
