//! Fight observers: the listener side of the fan-out.
//!
//! Every entity carries an ordered list of [`FightObserver`]s. When a fight
//! concludes, the combat resolver calls
//! [`Entity::notify_fight`](crate::entity::Entity::notify_fight) on the
//! attacker, which hands `(attacker, defender, won)` to each listener in
//! subscription order. Losses are delivered too; listeners filter.
//!
//! # Provided Observers
//!
//! - [`KillCounter`]: Counts calls and wins (aggregation and tests)
//! - [`KillLog`]: Keeps `attacker->defender` name pairs in memory
//! - [`ConsoleObserver`]: Prints kills to stdout under the console lock
//! - [`FileObserver`]: Appends one `Kill:` line per kill to a writer
//! - [`TracingObserver`]: Emits a structured `tracing` event per kill
//!
//! # Latency
//!
//! Listeners run synchronously inside the resolving task. Slow I/O in
//! `on_fight` directly delays fight resolution; offload it if that matters.

mod console;
mod file;
mod memory;
mod telemetry;

pub use console::ConsoleObserver;
pub use file::FileObserver;
pub use memory::{KillCounter, KillLog};
pub use telemetry::TracingObserver;

use std::sync::Arc;

use crate::entity::EntityRef;

/// Listener notified whenever a fight concludes.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use skirmish_core::entity::EntityRef;
/// use skirmish_core::observers::FightObserver;
///
/// #[derive(Default)]
/// struct Tally(AtomicUsize);
///
/// impl FightObserver for Tally {
///     fn on_fight(&self, _attacker: &EntityRef, _defender: &EntityRef, won: bool) {
///         if won {
///             self.0.fetch_add(1, Ordering::Relaxed);
///         }
///     }
/// }
/// ```
pub trait FightObserver: Send + Sync {
    /// Called once per concluded fight with the attacker's outcome.
    fn on_fight(&self, attacker: &EntityRef, defender: &EntityRef, won: bool);
}

/// Listener list handed to the factory; every created entity subscribes to
/// each of them in order.
pub type Observers = [Arc<dyn FightObserver>];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_is_object_safe() {
        fn _accepts_arc(_observer: Arc<dyn FightObserver>) {}
        fn _accepts_slice(_observers: &Observers) {}
    }
}
