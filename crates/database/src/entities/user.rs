//! User entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillswap_realtime::{UserId, UserProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub points: i64,
    pub review_summary: Option<ReviewSummary>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The display fields attached to chat messages.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// AI-generated summary of the reviews other users wrote about this user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub positive: String,
    pub negative: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
}
