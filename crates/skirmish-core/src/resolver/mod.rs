//! Resolver module: deciding fights and carrying them between tasks.
//!
//! # Architecture
//!
//! - [`CombatRules`] is the `(attacker kind, defender kind)` rule table.
//! - [`CombatResolver`] applies the table to concrete entities, rolls dice for
//!   contests and notifies the attacker's observers. It is shared by both
//!   resolution strategies:
//!   - the realtime scheduler ([`crate::simulation`]), which resolves one
//!     queued [`FightEvent`] at a time, attacker against defender only;
//!   - the batch sweep ([`CombatResolver::sweep`]), which resolves a frozen
//!     arena in one pass, challenging in both directions.
//! - [`FightChannel`] decouples fight discovery from fight resolution.
//! - [`DiceSource`] is the explicit random source every resolution draws from.
//!
//! # Invariants
//!
//! - Observers hear about every resolved fight exactly once, win or lose.
//! - Pairs outside the rule table never draw dice and never win.
//! - A dead defender is never challenged: [`CombatResolver::accept`]
//!   returns `false` without rolling or notifying.

mod combat;
mod dice;
mod event;
mod sweep;

pub use combat::{CombatResolver, CombatRules, Engagement};
pub use dice::{task_seed, Dice, DiceSource, ScriptedDice, DIE_FACES};
pub use event::{ChannelState, FightChannel, FightEvent};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dice_source_is_object_safe() {
        fn _accepts_boxed(_dice: Box<dyn DiceSource + Send>) {}
        fn _accepts_borrowed(_dice: &mut dyn DiceSource) {}
    }

    #[test]
    fn channel_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FightChannel>();
        assert_send_sync::<CombatResolver>();
    }
}
