//! Batch sweep: resolve every fight in a frozen arena in one pass.
//!
//! The sweep is the synchronous alternative to the realtime scheduler. Nothing
//! moves while it runs. Given the same arena order and the same dice it always
//! kills the same entities in the same order.
//!
//! # Algorithm
//!
//! For each attacker in arena order, skipping the dead and anything already
//! killed in this sweep, and for each other defender in range that has not
//! died in this sweep:
//!
//! 1. `defender_dead = accept(defender, attacker)`
//! 2. `attacker_dead = accept(attacker, defender)`
//! 3. A dead defender is killed and recorded.
//! 4. A dead attacker is killed and recorded, and stops scanning.
//!
//! Both challenges are issued before either death is applied, so an attacker
//! can take a defender down with it in the same exchange.

use std::collections::HashSet;

use tracing::debug;

use crate::arena::Arena;
use crate::entity::{EntityId, EntityRef};

use super::combat::CombatResolver;
use super::dice::DiceSource;

impl CombatResolver {
    /// Resolves every fight within `distance` in one deterministic pass.
    ///
    /// Returns the entities killed by this sweep, in the order they died.
    /// They stay in the arena; callers drop them from their own indexes, for
    /// example with [`Arena::remove_all`].
    ///
    /// # Example
    ///
    /// ```
    /// use skirmish_core::arena::Arena;
    /// use skirmish_core::entity::{Entity, EntityKind};
    /// use skirmish_core::resolver::{CombatResolver, ScriptedDice};
    ///
    /// let mut arena = Arena::new();
    /// arena.insert(Entity::new(EntityKind::Ork, "grub", 0, 0).into_ref());
    /// arena.insert(Entity::new(EntityKind::Druid, "elm", 6, 8).into_ref());
    ///
    /// let mut dice = ScriptedDice::attacker_always_wins();
    /// let dead = CombatResolver::new().sweep(&arena, 10, &mut dice);
    ///
    /// assert_eq!(dead.len(), 1);
    /// assert_eq!(dead[0].name(), "elm");
    /// ```
    pub fn sweep(
        &self,
        arena: &Arena,
        distance: u32,
        dice: &mut dyn DiceSource,
    ) -> Vec<EntityRef> {
        let mut dead: Vec<EntityRef> = Vec::new();
        let mut dead_ids: HashSet<EntityId> = HashSet::new();

        for attacker in arena {
            if !attacker.is_alive() || dead_ids.contains(&attacker.id()) {
                continue;
            }
            for defender in arena {
                if attacker.id() == defender.id()
                    || dead_ids.contains(&defender.id())
                    || !defender.is_alive()
                {
                    continue;
                }
                if !attacker.is_close(defender, distance) {
                    continue;
                }

                let defender_dead = self.accept(defender, attacker, dice);
                let attacker_dead = self.accept(attacker, defender, dice);

                if defender_dead {
                    defender.die();
                    dead_ids.insert(defender.id());
                    dead.push(defender.clone());
                }
                if attacker_dead {
                    attacker.die();
                    dead_ids.insert(attacker.id());
                    dead.push(attacker.clone());
                    break;
                }
            }
        }

        debug!(
            entities = arena.len(),
            distance,
            killed = dead.len(),
            "sweep complete"
        );
        dead
    }
}
