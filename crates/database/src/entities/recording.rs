//! Session recordings and their transcripts

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillswap_realtime::ExchangeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Processing,
    Completed,
    Failed,
}

impl RecordingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingStatus::Processing => "processing",
            RecordingStatus::Completed => "completed",
            RecordingStatus::Failed => "failed",
        }
    }
}

impl From<&str> for RecordingStatus {
    fn from(value: &str) -> Self {
        match value {
            "completed" => RecordingStatus::Completed,
            "failed" => RecordingStatus::Failed,
            _ => RecordingStatus::Processing,
        }
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    #[serde(rename = "_id")]
    pub id: String,
    pub exchange: ExchangeId,
    pub url: String,
    pub status: RecordingStatus,
    pub transcript: String,
    pub created_at: DateTime<Utc>,
}
