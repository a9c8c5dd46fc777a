//! Deadlines owned by a room worker.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::domain::session::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Caro turn clock
    Turn,
    /// Pending bot reply
    Bot,
    /// Disconnect grace for one player
    Grace(PlayerId),
}

/// At most one deadline per key. Arming supersedes, cancelling is idempotent.
#[derive(Debug, Default)]
pub struct RoomTimers {
    deadlines: HashMap<TimerKey, Instant>,
}

impl RoomTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, key: TimerKey, at: Instant) {
        self.deadlines.insert(key, at);
    }

    pub fn cancel(&mut self, key: &TimerKey) -> bool {
        self.deadlines.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    pub fn deadline(&self, key: &TimerKey) -> Option<Instant> {
        self.deadlines.get(key).copied()
    }

    pub fn is_armed(&self, key: &TimerKey) -> bool {
        self.deadlines.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every key whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKey> {
        let mut due: Vec<(Instant, TimerKey)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, at)| (*at, key.clone()))
            .collect();
        due.sort_by_key(|(at, _)| *at);
        for (_, key) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }
}
