//! Identifiers and records shared by the realtime core and its stores.

use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RealtimeError;

/// Record identifiers are cuid2-style: lowercase alphanumerics, at most 32 characters.
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]{1,32}$").expect("identifier pattern is a valid regex")
});

fn is_well_formed(raw: &str) -> bool {
    ID_PATTERN.is_match(raw)
}

/// Identifier of a platform user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: &str) -> Result<Self, RealtimeError> {
        if is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(RealtimeError::Validation("Invalid user ID.".to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a knowledge exchange between two users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    pub fn parse(raw: &str) -> Result<Self, RealtimeError> {
        if is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(RealtimeError::Validation("Invalid exchange ID.".to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named broadcast group.
///
/// ```
/// use skillswap_realtime::{ExchangeId, Room, UserId};
///
/// let personal = Room::Personal(UserId::parse("u1").unwrap());
/// let exchange = Room::Exchange(ExchangeId::parse("42").unwrap());
/// assert_eq!(personal.to_string(), "user-u1");
/// assert_eq!(exchange.to_string(), "exchange-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    Personal(UserId),
    Exchange(ExchangeId),
}

impl Room {
    pub fn is_exchange(&self) -> bool {
        matches!(self, Room::Exchange(_))
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Personal(user) => write!(f, "user-{user}"),
            Room::Exchange(exchange) => write!(f, "exchange-{exchange}"),
        }
    }
}

/// Display fields of a user, as resolved by the user store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub full_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl ExchangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::Rejected => "rejected",
            ExchangeStatus::Completed => "completed",
            ExchangeStatus::Cancelled => "cancelled",
        }
    }
}

impl From<&str> for ExchangeStatus {
    fn from(value: &str) -> Self {
        match value {
            "accepted" => ExchangeStatus::Accepted,
            "rejected" => ExchangeStatus::Rejected,
            "completed" => ExchangeStatus::Completed,
            "cancelled" => ExchangeStatus::Cancelled,
            _ => ExchangeStatus::Pending,
        }
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of an exchange the messaging core reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRecord {
    pub id: ExchangeId,
    pub initiator: UserId,
    pub receiver: UserId,
    pub status: ExchangeStatus,
}

impl ExchangeRecord {
    pub fn is_participant(&self, user: &UserId) -> bool {
        &self.initiator == user || &self.receiver == user
    }

    /// The other participant, or `None` when `user` is not part of the exchange.
    pub fn counterpart(&self, user: &UserId) -> Option<&UserId> {
        if &self.initiator == user {
            Some(&self.receiver)
        } else if &self.receiver == user {
            Some(&self.initiator)
        } else {
            None
        }
    }

    pub fn participants(&self) -> [&UserId; 2] {
        [&self.initiator, &self.receiver]
    }
}

/// Input to the message store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub sender: UserId,
    pub receiver: UserId,
    pub exchange: ExchangeId,
    pub content: String,
}

/// A persisted chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub sender: UserId,
    pub receiver: UserId,
    pub exchange: ExchangeId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_accept_cuid_like_values() {
        assert!(UserId::parse("clh3am8hi0000qwer1234abcd").is_ok());
        assert!(ExchangeId::parse("42").is_ok());
    }

    #[test]
    fn identifiers_reject_malformed_values() {
        for raw in ["", "ABC", "has space", "semi;colon", "x".repeat(33).as_str()] {
            assert!(ExchangeId::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn only_exchange_rooms_are_transient() {
        assert!(Room::Exchange(ExchangeId::parse("42").unwrap()).is_exchange());
        assert!(!Room::Personal(UserId::parse("u1").unwrap()).is_exchange());
    }

    #[test]
    fn counterpart_resolves_the_other_participant() {
        let exchange = ExchangeRecord {
            id: ExchangeId::parse("42").unwrap(),
            initiator: UserId::parse("a").unwrap(),
            receiver: UserId::parse("b").unwrap(),
            status: ExchangeStatus::Accepted,
        };

        assert_eq!(
            exchange.counterpart(&UserId::parse("a").unwrap()),
            Some(&UserId::parse("b").unwrap())
        );
        assert_eq!(
            exchange.counterpart(&UserId::parse("b").unwrap()),
            Some(&UserId::parse("a").unwrap())
        );
        assert_eq!(exchange.counterpart(&UserId::parse("c").unwrap()), None);
    }
}
