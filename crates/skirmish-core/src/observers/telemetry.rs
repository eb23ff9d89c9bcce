//! Structured-log sink for kills.

use tracing::info;

use crate::entity::EntityRef;

use super::FightObserver;

/// Emits an `info` event on the `skirmish::kills` target for every kill.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    /// Creates a tracing observer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FightObserver for TracingObserver {
    fn on_fight(&self, attacker: &EntityRef, defender: &EntityRef, won: bool) {
        if won {
            info!(
                target: "skirmish::kills",
                attacker = %attacker,
                attacker_id = attacker.id().as_u64(),
                defender = %defender,
                defender_id = defender.id().as_u64(),
                "kill"
            );
        }
    }
}
