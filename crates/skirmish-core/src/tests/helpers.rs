//! Test helper functions for building arenas, configurations and observers.

use std::sync::{Arc, Mutex, PoisonError};

use crate::arena::Arena;
use crate::config::SimulationConfig;
use crate::entity::{EntityKind, EntityRef};
use crate::factory;
use crate::observers::{FightObserver, KillCounter};

// =============================================================================
// Rosters
// =============================================================================

/// One roster entry: kind, name and starting position.
pub type Entry<'a> = (EntityKind, &'a str, i32, i32);

/// Builds an arena through the factory, returning it with the handles in
/// roster order.
pub fn build_arena(
    entries: &[Entry<'_>],
    observers: &[Arc<dyn FightObserver>],
) -> (Arena, Vec<EntityRef>) {
    let refs: Vec<EntityRef> = entries
        .iter()
        .map(|&(kind, name, x, y)| factory::create(kind, name, x, y, observers))
        .collect();
    (refs.iter().cloned().collect(), refs)
}

/// A counter plus the observer list it belongs to.
pub fn counted() -> (Arc<KillCounter>, Vec<Arc<dyn FightObserver>>) {
    let counter = Arc::new(KillCounter::new());
    let observers: Vec<Arc<dyn FightObserver>> = vec![counter.clone()];
    (counter, observers)
}

/// A grid of `count` entities cycling through the kinds, `spacing` apart.
pub fn grid_arena(count: usize, spacing: i32, observers: &[Arc<dyn FightObserver>]) -> Arena {
    let mut arena = Arena::with_capacity(count);
    let mut col = 0;
    let mut row = 0;
    for i in 0..count {
        let kind = EntityKind::ALL[i % EntityKind::ALL.len()];
        arena.insert(factory::create(
            kind,
            format!("g{i}"),
            col * spacing,
            row * spacing,
            observers,
        ));
        col += 1;
        if col == 10 {
            col = 0;
            row += 1;
        }
    }
    arena
}

// =============================================================================
// Configurations
// =============================================================================

/// A fast-ticking, seeded configuration without a kill log.
pub fn fast_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed: Some(seed),
        move_tick_ms: 1,
        report_tick_ms: 5,
        kill_log: None,
        ..SimulationConfig::default()
    }
}

/// Like [`fast_config`], but nothing ever moves.
pub fn frozen_config(seed: u64) -> SimulationConfig {
    let mut config = fast_config(seed);
    config.profiles.ork.step = 0;
    config.profiles.squirrel.step = 0;
    config.profiles.druid.step = 0;
    config
}

// =============================================================================
// Observers
// =============================================================================

/// Records every notification as `(attacker, defender, won)` names.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<(String, String, bool)>>,
}

impl RecordingObserver {
    /// Everything recorded so far, in call order.
    pub fn seen(&self) -> Vec<(String, String, bool)> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Only the winning notifications, as `attacker->defender`.
    pub fn kills(&self) -> Vec<String> {
        self.seen()
            .into_iter()
            .filter(|(_, _, won)| *won)
            .map(|(attacker, defender, _)| format!("{attacker}->{defender}"))
            .collect()
    }
}

impl FightObserver for RecordingObserver {
    fn on_fight(&self, attacker: &EntityRef, defender: &EntityRef, won: bool) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((attacker.name().to_string(), defender.name().to_string(), won));
    }
}

/// Names of the entities, in order.
pub fn names(entities: &[EntityRef]) -> Vec<String> {
    entities.iter().map(|e| e.name().to_string()).collect()
}
