//! In-memory store implementations for tests and local tooling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::stores::{ExchangeStore, MessageStore, StoreError, UserStore};
use crate::types::{ChatMessage, ExchangeId, ExchangeRecord, NewChatMessage, UserId, UserProfile};

/// Users, exchanges and messages held in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
    exchanges: Arc<RwLock<HashMap<ExchangeId, ExchangeRecord>>>,
    messages: Arc<RwLock<Vec<ChatMessage>>>,
    next_message: Arc<AtomicU64>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserProfile) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn insert_exchange(&self, exchange: ExchangeRecord) {
        self.exchanges.write().await.insert(exchange.id.clone(), exchange);
    }

    /// Make every subsequent message write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    pub async fn messages_for(&self, exchange: &ExchangeId) -> Vec<ChatMessage> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|message| &message.exchange == exchange)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

#[async_trait]
impl ExchangeStore for MemoryStore {
    async fn find_exchange(&self, id: &ExchangeId) -> Result<Option<ExchangeRecord>, StoreError> {
        Ok(self.exchanges.read().await.get(id).cloned())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, message: NewChatMessage) -> Result<ChatMessage, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::new("message store unavailable"));
        }

        let sequence = self.next_message.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = ChatMessage {
            id: format!("msg{sequence}"),
            sender: message.sender,
            receiver: message.receiver,
            exchange: message.exchange,
            content: message.content,
            created_at: Utc::now(),
        };

        self.messages.write().await.push(stored.clone());
        Ok(stored)
    }
}
