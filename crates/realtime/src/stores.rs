//! Narrow interfaces to the durable stores the core depends on.
//!
//! The stores provide their own concurrency control; the core never holds a
//! room lock while awaiting one of these calls.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ChatMessage, ExchangeId, ExchangeRecord, NewChatMessage, UserId, UserProfile};

#[derive(Debug, Error, Clone, PartialEq)]
#[error("store error: {message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Read-only user lookups.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError>;
}

/// Read access to exchanges and their two participants.
#[async_trait]
pub trait ExchangeStore: Send + Sync {
    async fn find_exchange(&self, id: &ExchangeId) -> Result<Option<ExchangeRecord>, StoreError>;
}

/// Create-only persistence for chat messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(&self, message: NewChatMessage) -> Result<ChatMessage, StoreError>;
}
