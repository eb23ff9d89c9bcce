//! In-memory observers for aggregation and tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::entity::{EntityId, EntityRef};

use super::FightObserver;

/// Counts every notification and every win.
///
/// Keeps the ids of the last winning pair rather than the entities
/// themselves, so a counter subscribed to an entity never keeps that entity
/// alive.
#[derive(Debug, Default)]
pub struct KillCounter {
    calls: AtomicUsize,
    wins: AtomicUsize,
    last_kill: Mutex<Option<(EntityId, EntityId)>>,
}

impl KillCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications received, wins and losses alike.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    /// Number of notifications with `won = true`.
    #[must_use]
    pub fn wins(&self) -> usize {
        self.wins.load(Ordering::Acquire)
    }

    /// Number of notifications with `won = false`.
    #[must_use]
    pub fn losses(&self) -> usize {
        self.calls().saturating_sub(self.wins())
    }

    /// `(attacker, defender)` ids of the most recent win.
    #[must_use]
    pub fn last_kill(&self) -> Option<(EntityId, EntityId)> {
        *self.last_kill.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FightObserver for KillCounter {
    fn on_fight(&self, attacker: &EntityRef, defender: &EntityRef, won: bool) {
        self.calls.fetch_add(1, Ordering::AcqRel);
        if won {
            self.wins.fetch_add(1, Ordering::AcqRel);
            *self.last_kill.lock().unwrap_or_else(PoisonError::into_inner) =
                Some((attacker.id(), defender.id()));
        }
    }
}

/// Records `attacker->defender` name pairs for every win, in order.
#[derive(Debug, Default)]
pub struct KillLog {
    entries: Mutex<Vec<String>>,
}

impl KillLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns `true` if no kill has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl FightObserver for KillLog {
    fn on_fight(&self, attacker: &EntityRef, defender: &EntityRef, won: bool) {
        if won {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{}->{}", attacker.name(), defender.name()));
        }
    }
}
