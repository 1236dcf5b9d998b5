//! Room membership bookkeeping.
//!
//! The registry is plain data. The connection manager owns it behind its lock,
//! so every method here runs inside one critical section.

use std::collections::{HashMap, HashSet};

use crate::connections::ConnectionId;
use crate::types::Room;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    members: HashMap<Room, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to `room`. Returns `false` when it was already a member.
    pub fn join(&mut self, room: Room, connection: ConnectionId) -> bool {
        let inserted = self
            .members
            .entry(room.clone())
            .or_default()
            .insert(connection);
        self.memberships.entry(connection).or_default().insert(room);
        inserted
    }

    /// Remove `connection` from `room`. Returns `false` when it was not a member.
    pub fn leave(&mut self, room: &Room, connection: ConnectionId) -> bool {
        let removed = match self.members.get_mut(room) {
            Some(members) => members.remove(&connection),
            None => false,
        };

        if removed {
            self.discard_if_empty(room);
            if let Some(rooms) = self.memberships.get_mut(&connection) {
                rooms.remove(room);
                if rooms.is_empty() {
                    self.memberships.remove(&connection);
                }
            }
        }

        removed
    }

    /// Drop every membership held by `connection`, returning the rooms it left.
    pub fn leave_all(&mut self, connection: ConnectionId) -> Vec<Room> {
        let rooms: Vec<Room> = self
            .memberships
            .remove(&connection)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default();

        for room in &rooms {
            if let Some(members) = self.members.get_mut(room) {
                members.remove(&connection);
            }
            self.discard_if_empty(room);
        }

        rooms
    }

    /// Snapshot of the current members of `room`.
    pub fn members(&self, room: &Room) -> Vec<ConnectionId> {
        self.members
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, connection: ConnectionId) -> Vec<Room> {
        self.memberships
            .get(&connection)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, room: &Room, connection: ConnectionId) -> bool {
        self.members
            .get(room)
            .map_or(false, |members| members.contains(&connection))
    }

    /// Whether a room entry exists, empty or not.
    pub fn has_room(&self, room: &Room) -> bool {
        self.members.contains_key(room)
    }

    // Personal rooms persist once created; exchange rooms go away when empty.
    fn discard_if_empty(&mut self, room: &Room) {
        if !room.is_exchange() {
            return;
        }
        if self.members.get(room).map_or(false, HashSet::is_empty) {
            self.members.remove(room);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExchangeId, UserId};

    fn exchange(id: &str) -> Room {
        Room::Exchange(ExchangeId::parse(id).unwrap())
    }

    fn personal(id: &str) -> Room {
        Room::Personal(UserId::parse(id).unwrap())
    }

    #[test]
    fn join_is_idempotent() {
        let mut registry = RoomRegistry::new();
        let connection = ConnectionId::new();

        assert!(registry.join(exchange("42"), connection));
        assert!(!registry.join(exchange("42"), connection));
        assert_eq!(registry.members(&exchange("42")), vec![connection]);
    }

    #[test]
    fn leaving_a_room_twice_is_a_no_op() {
        let mut registry = RoomRegistry::new();
        let connection = ConnectionId::new();

        registry.join(exchange("42"), connection);
        assert!(registry.leave(&exchange("42"), connection));
        assert!(!registry.leave(&exchange("42"), connection));
        assert!(!registry.leave(&exchange("7"), connection));
    }

    #[test]
    fn empty_exchange_rooms_are_discarded_but_personal_rooms_stay() {
        let mut registry = RoomRegistry::new();
        let connection = ConnectionId::new();

        registry.join(exchange("42"), connection);
        registry.join(personal("u1"), connection);
        registry.leave(&exchange("42"), connection);
        registry.leave(&personal("u1"), connection);

        assert!(!registry.has_room(&exchange("42")));
        assert!(registry.has_room(&personal("u1")));
        assert!(registry.members(&personal("u1")).is_empty());
    }

    #[test]
    fn leave_all_clears_every_membership() {
        let mut registry = RoomRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        registry.join(personal("u1"), first);
        registry.join(exchange("42"), first);
        registry.join(exchange("42"), second);

        let mut left = registry.leave_all(first);
        left.sort_by_key(|room| room.to_string());
        assert_eq!(left, vec![exchange("42"), personal("u1")]);

        assert!(!registry.contains(&exchange("42"), first));
        assert!(registry.contains(&exchange("42"), second));
        assert!(registry.rooms_of(first).is_empty());
        assert!(registry.leave_all(first).is_empty());
    }
}
