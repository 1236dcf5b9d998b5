//! Live connection table and room-scoped broadcast.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::ServerEvent;
use crate::rooms::RoomRegistry;
use crate::types::{Room, UserId, UserProfile};

/// Default per-connection outbound queue length.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Opaque identifier of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A connection admitted to the manager, bound to the identity it authenticated as.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user: UserProfile,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

/// Frames queued for one connection, drained by its writer task.
pub type EventStream = mpsc::Receiver<Arc<ServerEvent>>;

struct ConnectionEntry {
    user: UserId,
    outbound: mpsc::Sender<Arc<ServerEvent>>,
}

#[derive(Default)]
struct Inner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: RoomRegistry,
}

/// Owns every live connection and its room memberships.
///
/// All mutations and broadcasts take the same lock, so frames sent to one room
/// reach each member in the order the broadcasts entered the critical section.
/// Delivery is a non-blocking enqueue onto the member's outbound channel; a
/// full or closed channel drops the frame for that member only.
pub struct ConnectionManager {
    inner: Mutex<Inner>,
    outbound_buffer: usize,
}

impl ConnectionManager {
    pub fn new(outbound_buffer: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            outbound_buffer: outbound_buffer.max(1),
        }
    }

    /// Register an authenticated connection and join its personal room.
    pub async fn admit(&self, user: UserProfile) -> (ConnectionHandle, EventStream) {
        let (outbound, stream) = mpsc::channel(self.outbound_buffer);
        let id = ConnectionId::new();
        let personal = Room::Personal(user.id.clone());

        {
            let mut inner = self.inner.lock().await;
            inner.connections.insert(
                id,
                ConnectionEntry {
                    user: user.id.clone(),
                    outbound,
                },
            );
            inner.rooms.join(personal, id);
        }

        info!(connection = %id, user = %user.id, "connection admitted");
        (ConnectionHandle { id, user }, stream)
    }

    /// Add the connection to `room`. Returns `false` if it was already a member
    /// or the connection is gone.
    pub async fn join_room(&self, handle: &ConnectionHandle, room: Room) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.connections.contains_key(&handle.id) {
            return false;
        }
        let joined = inner.rooms.join(room.clone(), handle.id);
        if joined {
            debug!(connection = %handle.id, room = %room, "joined room");
        }
        joined
    }

    /// Remove the connection from `room`. Leaving a room it never joined is a no-op.
    pub async fn leave_room(&self, handle: &ConnectionHandle, room: &Room) -> bool {
        let left = self.inner.lock().await.rooms.leave(room, handle.id);
        if left {
            debug!(connection = %handle.id, room = %room, "left room");
        }
        left
    }

    /// Enqueue `event` for every current member of `room`. Returns how many
    /// members accepted the frame.
    pub async fn broadcast_to_room(&self, room: &Room, event: ServerEvent) -> usize {
        let event = Arc::new(event);
        let inner = self.inner.lock().await;
        let mut delivered = 0;

        for member in inner.rooms.members(room) {
            let Some(entry) = inner.connections.get(&member) else {
                continue;
            };
            if enqueue(member, entry, &event) {
                delivered += 1;
            }
        }

        debug!(room = %room, event = event.name(), delivered, "broadcast");
        delivered
    }

    /// Enqueue `event` for a single connection.
    pub async fn send_to(&self, handle: &ConnectionHandle, event: ServerEvent) -> bool {
        let event = Arc::new(event);
        let inner = self.inner.lock().await;
        match inner.connections.get(&handle.id) {
            Some(entry) => enqueue(handle.id, entry, &event),
            None => false,
        }
    }

    /// Drop the connection and all of its memberships. Safe to call repeatedly.
    pub async fn remove(&self, handle: &ConnectionHandle) -> bool {
        let (removed, rooms) = {
            let mut inner = self.inner.lock().await;
            let removed = inner.connections.remove(&handle.id).is_some();
            let rooms = inner.rooms.leave_all(handle.id);
            (removed, rooms)
        };

        if removed {
            info!(
                connection = %handle.id,
                user = %handle.user.id,
                rooms = rooms.len(),
                "connection removed"
            );
        }
        removed
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.lock().await.connections.len()
    }

    /// Number of live connections bound to `user`.
    pub async fn connections_for(&self, user: &UserId) -> usize {
        self.inner
            .lock()
            .await
            .connections
            .values()
            .filter(|entry| &entry.user == user)
            .count()
    }

    pub async fn rooms_of(&self, handle: &ConnectionHandle) -> Vec<Room> {
        self.inner.lock().await.rooms.rooms_of(handle.id)
    }

    pub async fn room_members(&self, room: &Room) -> Vec<ConnectionId> {
        self.inner.lock().await.rooms.members(room)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_BUFFER)
    }
}

fn enqueue(id: ConnectionId, entry: &ConnectionEntry, event: &Arc<ServerEvent>) -> bool {
    match entry.outbound.try_send(Arc::clone(event)) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(
                connection = %id,
                user = %entry.user,
                event = event.name(),
                "outbound queue full, dropping frame"
            );
            false
        }
        // Writer already gone; removal is on its way.
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ErrorPayload;
    use crate::types::ExchangeId;

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: UserId::parse(id).unwrap(),
            full_name: format!("User {id}"),
            avatar: None,
        }
    }

    fn error_event(message: &str) -> ServerEvent {
        ServerEvent::SendMessageError(ErrorPayload {
            message: message.to_string(),
        })
    }

    #[tokio::test]
    async fn admit_joins_the_personal_room() {
        let manager = ConnectionManager::default();
        let (handle, _stream) = manager.admit(profile("u1")).await;

        assert_eq!(
            manager.rooms_of(&handle).await,
            vec![Room::Personal(UserId::parse("u1").unwrap())]
        );
        assert_eq!(manager.connection_count().await, 1);
        assert_eq!(manager.connections_for(handle.user_id()).await, 1);
    }

    #[tokio::test]
    async fn full_outbound_queue_drops_without_blocking() {
        let manager = ConnectionManager::new(1);
        let (handle, mut stream) = manager.admit(profile("u1")).await;
        let room = Room::Personal(handle.user_id().clone());

        assert_eq!(manager.broadcast_to_room(&room, error_event("one")).await, 1);
        assert_eq!(manager.broadcast_to_room(&room, error_event("two")).await, 0);

        assert_eq!(*stream.recv().await.unwrap(), error_event("one"));
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn removed_connections_cannot_rejoin() {
        let manager = ConnectionManager::default();
        let (handle, _stream) = manager.admit(profile("u1")).await;
        let room = Room::Exchange(ExchangeId::parse("42").unwrap());

        assert!(manager.remove(&handle).await);
        assert!(!manager.remove(&handle).await);
        assert!(!manager.join_room(&handle, room.clone()).await);
        assert!(manager.room_members(&room).await.is_empty());
        assert!(!manager.send_to(&handle, error_event("late")).await);
    }

    #[tokio::test]
    async fn dropped_stream_is_treated_as_undeliverable() {
        let manager = ConnectionManager::default();
        let (handle, stream) = manager.admit(profile("u1")).await;
        drop(stream);

        assert!(!manager.send_to(&handle, error_event("gone")).await);
    }
}
