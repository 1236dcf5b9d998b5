//! Repository for chat message persistence and history.

use async_trait::async_trait;
use chrono::Utc;
use skillswap_realtime::{
    ChatMessage, ExchangeId, MessageStore, MessageView, NewChatMessage, StoreError, UserProfile,
};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::{exchange_id_column, timestamp_column, user_id_column};
use crate::types::{timestamp, DatabaseResult};

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, message: NewChatMessage) -> DatabaseResult<ChatMessage> {
        let id = cuid2::cuid();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO messages (id, sender_id, receiver_id, exchange_id, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(message.sender.as_str())
        .bind(message.receiver.as_str())
        .bind(message.exchange.as_str())
        .bind(&message.content)
        .bind(timestamp(created_at))
        .execute(&self.pool)
        .await?;

        debug!(message_id = %id, exchange_id = %message.exchange, "stored chat message");

        Ok(ChatMessage {
            id,
            sender: message.sender,
            receiver: message.receiver,
            exchange: message.exchange,
            content: message.content,
            created_at,
        })
    }

    /// All messages of an exchange, oldest first, with sender display fields.
    pub async fn history(&self, exchange: &ExchangeId) -> DatabaseResult<Vec<MessageView>> {
        let rows = sqlx::query(
            "SELECT m.id, m.sender_id, m.receiver_id, m.exchange_id, m.content, m.created_at,
                    u.full_name AS sender_name, u.avatar AS sender_avatar
             FROM messages m
             JOIN users u ON u.id = m.sender_id
             WHERE m.exchange_id = ?
             ORDER BY m.created_at ASC, m.rowid ASC",
        )
        .bind(exchange.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(MessageView {
                    id: row.try_get("id")?,
                    sender: UserProfile {
                        id: user_id_column(row, "sender_id")?,
                        full_name: row.try_get("sender_name")?,
                        avatar: row.try_get("sender_avatar")?,
                    },
                    receiver: user_id_column(row, "receiver_id")?,
                    exchange: exchange_id_column(row, "exchange_id")?,
                    content: row.try_get("content")?,
                    created_at: timestamp_column(row, "created_at")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn create_message(&self, message: NewChatMessage) -> Result<ChatMessage, StoreError> {
        Ok(self.create(message).await?)
    }
}
