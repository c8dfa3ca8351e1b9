//! Ordered registry of connected sessions
//!
//! Iteration order is connection order, changed only by `move_to_tail`.
//! Matchmaking scans in this order, so players who just finished a match
//! are considered last.
//!
//! Each entry carries a slot number; the slot map keeps the order. Moving a
//! session to the tail gives it a fresh, larger slot, so append, remove and
//! move are all logarithmic rather than list walks.

use crate::session::{Session, SessionId};
use log::info;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
struct Entry {
    slot: u64,
    session: Session,
}

#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<SessionId, Entry>,
    order: BTreeMap<u64, SessionId>,
    next_slot: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session at the tail. Returns false if the id is already present.
    pub fn append(&mut self, session: Session) -> bool {
        if self.sessions.contains_key(&session.id) {
            return false;
        }

        let slot = self.take_slot();
        info!("Client {} connected from {}", session.id, session.addr);
        self.order.insert(slot, session.id);
        self.sessions.insert(session.id, Entry { slot, session });
        true
    }

    /// Unlinks a session and hands it back to the caller.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let entry = self.sessions.remove(&id)?;
        self.order.remove(&entry.slot);
        info!("Removing client {} ({})", entry.session.id, entry.session.name);
        Some(entry.session)
    }

    /// Relocates a session to the end; no-op if unknown or already last.
    pub fn move_to_tail(&mut self, id: SessionId) {
        let is_last = self
            .order
            .last_key_value()
            .map_or(true, |(_, last)| *last == id);
        if is_last {
            return;
        }

        let slot = self.take_slot();
        if let Some(entry) = self.sessions.get_mut(&id) {
            self.order.remove(&entry.slot);
            entry.slot = slot;
            self.order.insert(slot, id);
        }
    }

    fn take_slot(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id).map(|entry| &entry.session)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id).map(|entry| &mut entry.session)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Sessions in registry order
    pub fn iter(&self) -> impl Iterator<Item = &Session> + '_ {
        self.order
            .values()
            .filter_map(move |id| self.sessions.get(id).map(|entry| &entry.session))
    }

    /// Snapshot of ids in registry order, for passes that mutate sessions
    pub fn ids(&self) -> Vec<SessionId> {
        self.order.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
