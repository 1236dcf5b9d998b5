//! Wire events exchanged with connected clients.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`. Payload
//! shapes are fixed per event name and checked when a frame is decoded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, ExchangeId, UserId, UserProfile};

/// Client events received from the socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join the chat room of an exchange
    JoinExchange(String),
    /// Leave the chat room of an exchange
    LeaveExchange(String),
    /// Send a chat message to an exchange
    SendMessage(SendMessagePayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub exchange_id: String,
    pub content: String,
}

/// Server events sent to socket clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A chat message was persisted in an exchange the client has joined
    NewMessage(MessageView),
    /// A `sendMessage` from this connection was rejected
    SendMessageError(ErrorPayload),
    /// A `joinExchange` from this connection was rejected
    JoinExchangeError(ErrorPayload),
    NewNotification(NotificationView),
    AchievementUnlocked(AchievementUnlocked),
    TranscriptReady(TranscriptReady),
    SkillVerified(SkillVerified),
    ReviewSummaryUpdated,
}

impl ServerEvent {
    /// Wire name of the event, used as a log field.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::SendMessageError(_) => "sendMessageError",
            ServerEvent::JoinExchangeError(_) => "joinExchangeError",
            ServerEvent::NewNotification(_) => "newNotification",
            ServerEvent::AchievementUnlocked(_) => "achievementUnlocked",
            ServerEvent::TranscriptReady(_) => "transcriptReady",
            ServerEvent::SkillVerified(_) => "skillVerified",
            ServerEvent::ReviewSummaryUpdated => "reviewSummaryUpdated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// A persisted message with the sender's display fields resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(rename = "_id")]
    pub id: String,
    pub sender: UserProfile,
    pub receiver: UserId,
    pub exchange: ExchangeId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(message: ChatMessage, sender: UserProfile) -> Self {
        Self {
            id: message.id,
            sender,
            receiver: message.receiver,
            exchange: message.exchange,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: UserId,
    pub message: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementUnlocked {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptReady {
    pub recording_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillVerified {
    pub topic_name: String,
}

/// Events background producers may push to a user's personal room.
#[derive(Debug, Clone, PartialEq)]
pub enum FanoutEvent {
    NewNotification(NotificationView),
    AchievementUnlocked(AchievementUnlocked),
    TranscriptReady(TranscriptReady),
    SkillVerified(SkillVerified),
    ReviewSummaryUpdated,
}

impl From<FanoutEvent> for ServerEvent {
    fn from(event: FanoutEvent) -> Self {
        match event {
            FanoutEvent::NewNotification(payload) => ServerEvent::NewNotification(payload),
            FanoutEvent::AchievementUnlocked(payload) => ServerEvent::AchievementUnlocked(payload),
            FanoutEvent::TranscriptReady(payload) => ServerEvent::TranscriptReady(payload),
            FanoutEvent::SkillVerified(payload) => ServerEvent::SkillVerified(payload),
            FanoutEvent::ReviewSummaryUpdated => ServerEvent::ReviewSummaryUpdated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_decode_from_named_frames() {
        let join: ClientEvent =
            serde_json::from_value(json!({"event": "joinExchange", "data": "42"})).unwrap();
        assert_eq!(join, ClientEvent::JoinExchange("42".to_string()));

        let send: ClientEvent = serde_json::from_value(json!({
            "event": "sendMessage",
            "data": {"exchangeId": "42", "content": "hello"}
        }))
        .unwrap();
        assert_eq!(
            send,
            ClientEvent::SendMessage(SendMessagePayload {
                exchange_id: "42".to_string(),
                content: "hello".to_string(),
            })
        );
    }

    #[test]
    fn client_events_with_wrong_payload_shape_are_rejected() {
        let result = serde_json::from_value::<ClientEvent>(json!({
            "event": "sendMessage",
            "data": "42"
        }));
        assert!(result.is_err());

        let result =
            serde_json::from_value::<ClientEvent>(json!({"event": "deleteExchange", "data": "42"}));
        assert!(result.is_err());
    }

    #[test]
    fn server_events_encode_camel_case_payloads() {
        let event = ServerEvent::TranscriptReady(TranscriptReady {
            recording_id: "rec1".to_string(),
            title: "Recording from 1/2/2024".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "transcriptReady",
                "data": {"recordingId": "rec1", "title": "Recording from 1/2/2024"}
            })
        );

        let value = serde_json::to_value(ServerEvent::ReviewSummaryUpdated).unwrap();
        assert_eq!(value["event"], "reviewSummaryUpdated");
    }

    #[test]
    fn message_view_embeds_sender_display_fields() {
        let view = MessageView {
            id: "m1".to_string(),
            sender: UserProfile {
                id: UserId::parse("u1").unwrap(),
                full_name: "Ada Lovelace".to_string(),
                avatar: Some("https://img/ada.png".to_string()),
            },
            receiver: UserId::parse("u2").unwrap(),
            exchange: ExchangeId::parse("42").unwrap(),
            content: "hello".to_string(),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(ServerEvent::NewMessage(view)).unwrap();
        assert_eq!(value["event"], "newMessage");
        assert_eq!(value["data"]["_id"], "m1");
        assert_eq!(value["data"]["sender"]["_id"], "u1");
        assert_eq!(value["data"]["sender"]["fullName"], "Ada Lovelace");
        assert_eq!(value["data"]["receiver"], "u2");
        assert!(value["data"]["createdAt"].is_string());
    }
}
