//! Per-connection dispatch of client events.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::connections::{ConnectionHandle, ConnectionManager};
use crate::error::RealtimeError;
use crate::events::{ClientEvent, ErrorPayload, ServerEvent};
use crate::pipeline::ChatPipeline;
use crate::types::{ExchangeId, Room};

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Require exchange participation before joining an exchange room.
    pub authorize_joins: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            authorize_joins: true,
        }
    }
}

/// One admitted connection's view of the realtime core.
///
/// Events must be handled one at a time, in arrival order.
pub struct Session {
    handle: ConnectionHandle,
    connections: Arc<ConnectionManager>,
    pipeline: Arc<ChatPipeline>,
    options: SessionOptions,
}

impl Session {
    pub fn new(
        handle: ConnectionHandle,
        connections: Arc<ConnectionManager>,
        pipeline: Arc<ChatPipeline>,
        options: SessionOptions,
    ) -> Self {
        Self {
            handle,
            connections,
            pipeline,
            options,
        }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Decode and dispatch one text frame. Frames that do not match a known
    /// event shape are dropped.
    pub async fn handle_text(&self, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle_event(event).await,
            Err(err) => {
                debug!(
                    connection = %self.handle.id(),
                    error = %err,
                    "ignoring malformed client frame"
                );
            }
        }
    }

    pub async fn handle_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::JoinExchange(exchange_id) => self.join_exchange(&exchange_id).await,
            ClientEvent::LeaveExchange(exchange_id) => self.leave_exchange(&exchange_id).await,
            ClientEvent::SendMessage(payload) => {
                self.send_message(&payload.exchange_id, &payload.content).await
            }
        }
    }

    async fn join_exchange(&self, raw_exchange_id: &str) {
        let exchange_id = if self.options.authorize_joins {
            match self.pipeline.authorize(self.handle.user_id(), raw_exchange_id).await {
                Ok(exchange) => exchange.id,
                Err(err) => {
                    self.reject_join(err).await;
                    return;
                }
            }
        } else {
            match ExchangeId::parse(raw_exchange_id) {
                Ok(id) => id,
                Err(err) => {
                    self.reject_join(err).await;
                    return;
                }
            }
        };

        self.connections
            .join_room(&self.handle, Room::Exchange(exchange_id))
            .await;
    }

    async fn leave_exchange(&self, raw_exchange_id: &str) {
        // Nothing can have been joined under a malformed id.
        let Ok(exchange_id) = ExchangeId::parse(raw_exchange_id) else {
            return;
        };
        self.connections
            .leave_room(&self.handle, &Room::Exchange(exchange_id))
            .await;
    }

    async fn send_message(&self, raw_exchange_id: &str, content: &str) {
        if let Err(err) = self.pipeline.send(&self.handle, raw_exchange_id, content).await {
            log_rejection("sendMessage", &self.handle, &err);
            let event = ServerEvent::SendMessageError(ErrorPayload {
                message: err.client_message(),
            });
            self.connections.send_to(&self.handle, event).await;
        }
    }

    async fn reject_join(&self, err: RealtimeError) {
        log_rejection("joinExchange", &self.handle, &err);
        let message = match err {
            RealtimeError::Authorization(_) => "Unauthorized to join this exchange.".to_string(),
            other => other.client_message(),
        };
        let event = ServerEvent::JoinExchangeError(ErrorPayload { message });
        self.connections.send_to(&self.handle, event).await;
    }

    /// Remove the connection from the manager. Safe to call more than once.
    pub async fn close(&self) {
        self.connections.remove(&self.handle).await;
    }
}

fn log_rejection(operation: &str, handle: &ConnectionHandle, err: &RealtimeError) {
    match err {
        RealtimeError::Persistence(detail) => warn!(
            connection = %handle.id(),
            user = %handle.user_id(),
            operation,
            error = %detail,
            "operation failed"
        ),
        other => debug!(
            connection = %handle.id(),
            user = %handle.user_id(),
            operation,
            kind = other.kind(),
            error = %other,
            "operation rejected"
        ),
    }
}
