//! Chat message pipeline: authorize, persist, broadcast.

use std::sync::Arc;

use tracing::{debug, info};

use crate::connections::{ConnectionHandle, ConnectionManager};
use crate::error::{RealtimeError, RealtimeResult};
use crate::events::{MessageView, ServerEvent};
use crate::stores::{ExchangeStore, MessageStore};
use crate::types::{ExchangeId, ExchangeRecord, NewChatMessage, Room, UserId};

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 5_000;

pub struct ChatPipeline {
    exchanges: Arc<dyn ExchangeStore>,
    messages: Arc<dyn MessageStore>,
    connections: Arc<ConnectionManager>,
}

impl ChatPipeline {
    pub fn new(
        exchanges: Arc<dyn ExchangeStore>,
        messages: Arc<dyn MessageStore>,
        connections: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            exchanges,
            messages,
            connections,
        }
    }

    /// Resolve `raw_exchange_id` and check that `user` takes part in it.
    ///
    /// Checks run in a fixed order and stop at the first failure: identifier
    /// format, existence, then participation.
    pub async fn authorize(&self, user: &UserId, raw_exchange_id: &str) -> RealtimeResult<ExchangeRecord> {
        let exchange_id = ExchangeId::parse(raw_exchange_id)?;
        self.authorize_parsed(user, &exchange_id).await
    }

    async fn authorize_parsed(&self, user: &UserId, exchange_id: &ExchangeId) -> RealtimeResult<ExchangeRecord> {
        let exchange = self
            .exchanges
            .find_exchange(exchange_id)
            .await?
            .ok_or(RealtimeError::NotFound("exchange"))?;

        if !exchange.is_participant(user) {
            return Err(RealtimeError::Authorization(
                "Unauthorized to send message to this exchange.".to_string(),
            ));
        }

        Ok(exchange)
    }

    /// Persist a message from the connection's user and broadcast it to the
    /// exchange room.
    ///
    /// The content is only checked once the sender is known to take part in
    /// the exchange.
    ///
    /// The sender is always the identity bound to `handle`. The broadcast only
    /// happens after the store has accepted the message; callers await this
    /// per message, which keeps one connection's messages in order.
    pub async fn send(
        &self,
        handle: &ConnectionHandle,
        raw_exchange_id: &str,
        content: &str,
    ) -> RealtimeResult<MessageView> {
        let sender = handle.user_id();
        let exchange_id = ExchangeId::parse(raw_exchange_id)?;

        let exchange = self.authorize_parsed(sender, &exchange_id).await?;
        let receiver = exchange
            .counterpart(sender)
            .cloned()
            .ok_or_else(|| RealtimeError::Authorization("Unauthorized to send message to this exchange.".to_string()))?;
        validate_content(content)?;

        let message = self
            .messages
            .create_message(NewChatMessage {
                sender: sender.clone(),
                receiver,
                exchange: exchange.id.clone(),
                content: content.to_string(),
            })
            .await?;

        let view = MessageView::new(message, handle.user().clone());
        let room = Room::Exchange(exchange.id);
        let delivered = self
            .connections
            .broadcast_to_room(&room, ServerEvent::NewMessage(view.clone()))
            .await;

        info!(
            message = %view.id,
            exchange = %view.exchange,
            sender = %sender,
            delivered,
            "chat message sent"
        );
        Ok(view)
    }
}

fn validate_content(content: &str) -> RealtimeResult<()> {
    if content.trim().is_empty() {
        debug!("rejecting empty chat message");
        return Err(RealtimeError::Validation("Message content is required.".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(RealtimeError::Validation("Message is too long.".to_string()));
    }
    Ok(())
}
