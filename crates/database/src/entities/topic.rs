//! Topics and verified skills

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillswap_realtime::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedSkill {
    pub user: UserId,
    pub topic: String,
    pub verified_at: DateTime<Utc>,
}
