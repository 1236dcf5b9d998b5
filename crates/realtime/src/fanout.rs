//! Best-effort delivery of background events to users' personal rooms.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::connections::ConnectionManager;
use crate::events::FanoutEvent;
use crate::types::{Room, UserId};

/// Process-wide entry point for pushing events to a single user.
///
/// Callers persist their state before notifying. Nothing is queued for users
/// without a live connection, and no failure is ever returned.
#[derive(Clone)]
pub struct FanoutGateway {
    connections: Arc<ConnectionManager>,
}

impl FanoutGateway {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Deliver `event` to every live connection of `user`.
    pub async fn notify(&self, user: &UserId, event: FanoutEvent) {
        let room = Room::Personal(user.clone());
        let delivered = self.connections.broadcast_to_room(&room, event.into()).await;
        if delivered == 0 {
            debug!(user = %user, "no live connection, fanout event discarded");
        }
    }

    /// Deliver the same event to several users, once per distinct user.
    pub async fn notify_many<'a, I>(&self, users: I, event: FanoutEvent)
    where
        I: IntoIterator<Item = &'a UserId>,
    {
        let mut seen = HashSet::new();
        for user in users {
            if seen.insert(user) {
                self.notify(user, event.clone()).await;
            }
        }
    }
}
