//! Combat protocol: who may fight whom, and who wins.
//!
//! The protocol is a table keyed by `(attacker kind, defender kind)`. Each
//! entry is an [`Engagement`]:
//!
//! | Attacker | vs Ork | vs Squirrel | vs Druid |
//! |---|---|---|---|
//! | Ork | no contest | no contest | dice contest |
//! | Squirrel | no contest | no contest | no contest |
//! | Druid | no contest | dice contest | no contest |
//!
//! Pairs missing from the table are no contest, so a new kind only needs its
//! own entries added; existing rules are never edited.
//!
//! # Outcomes
//!
//! - **No contest**: the attacker does not win, no randomness is drawn.
//! - **Dice contest**: one attack roll and one defense roll, each `1..=6`;
//!   the attacker wins only on a strictly higher roll.
//!
//! Either way the attacker's observers hear about the fight exactly once.

use std::collections::HashMap;

use tracing::trace;

use crate::entity::{EntityKind, EntityRef};

use super::dice::DiceSource;

/// How a given attacker kind engages a given defender kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engagement {
    /// The attacker cannot win; nothing is rolled.
    NoContest,
    /// Attack roll against defense roll; ties go to the defender.
    DiceContest,
}

/// Rule table keyed by `(attacker kind, defender kind)`.
///
/// # Example
///
/// ```
/// use skirmish_core::entity::EntityKind;
/// use skirmish_core::resolver::{CombatRules, Engagement};
///
/// let rules = CombatRules::standard();
/// assert!(rules.can_attack(EntityKind::Ork, EntityKind::Druid));
/// assert!(!rules.can_attack(EntityKind::Druid, EntityKind::Ork));
/// assert_eq!(
///     rules.engagement(EntityKind::Squirrel, EntityKind::Squirrel),
///     Engagement::NoContest,
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatRules {
    table: HashMap<(EntityKind, EntityKind), Engagement>,
}

impl CombatRules {
    /// A table in which nobody can win.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// The standard rules: Orks contest Druids, Druids contest Squirrels.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(EntityKind::Ork, EntityKind::Druid, Engagement::DiceContest)
            .with_rule(
                EntityKind::Druid,
                EntityKind::Squirrel,
                Engagement::DiceContest,
            )
    }

    /// Sets the engagement for one ordered pair of kinds.
    #[must_use]
    pub fn with_rule(
        mut self,
        attacker: EntityKind,
        defender: EntityKind,
        engagement: Engagement,
    ) -> Self {
        self.table.insert((attacker, defender), engagement);
        self
    }

    /// Returns the engagement for an ordered pair; absent pairs are
    /// [`Engagement::NoContest`].
    #[must_use]
    pub fn engagement(&self, attacker: EntityKind, defender: EntityKind) -> Engagement {
        self.table
            .get(&(attacker, defender))
            .copied()
            .unwrap_or(Engagement::NoContest)
    }

    /// Returns `true` if the attacker kind can ever win against the defender
    /// kind.
    #[must_use]
    pub fn can_attack(&self, attacker: EntityKind, defender: EntityKind) -> bool {
        self.engagement(attacker, defender) == Engagement::DiceContest
    }
}

impl Default for CombatRules {
    fn default() -> Self {
        Self::standard()
    }
}

/// Applies [`CombatRules`] to concrete entities and notifies observers.
///
/// Both the realtime scheduler and the batch sweep resolve fights through
/// this type, so they share one canonical rule table.
///
/// # Example
///
/// ```
/// use skirmish_core::entity::{Entity, EntityKind};
/// use skirmish_core::resolver::{CombatResolver, ScriptedDice};
///
/// let combat = CombatResolver::new();
/// let mut dice = ScriptedDice::attacker_always_wins();
/// let ork = Entity::new(EntityKind::Ork, "grub", 0, 0).into_ref();
/// let druid = Entity::new(EntityKind::Druid, "elm", 1, 1).into_ref();
///
/// assert!(combat.resolve(&ork, &druid, &mut dice));
/// assert!(!combat.resolve(&druid, &ork, &mut dice));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombatResolver {
    rules: CombatRules,
}

impl CombatResolver {
    /// Creates a resolver with the standard rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with custom rules.
    #[must_use]
    pub fn with_rules(rules: CombatRules) -> Self {
        Self { rules }
    }

    /// Returns the rule table.
    #[must_use]
    pub fn rules(&self) -> &CombatRules {
        &self.rules
    }

    /// Returns `true` if `attacker` could win against `defender` by kind.
    #[must_use]
    pub fn can_attack(&self, attacker: &EntityRef, defender: &EntityRef) -> bool {
        self.rules.can_attack(attacker.kind(), defender.kind())
    }

    /// Decides a fight between two kinds, drawing dice only for a contest.
    ///
    /// Returns `true` if the attacker wins. No observer is notified.
    pub fn contest(
        &self,
        attacker: EntityKind,
        defender: EntityKind,
        dice: &mut dyn DiceSource,
    ) -> bool {
        match self.rules.engagement(attacker, defender) {
            Engagement::NoContest => false,
            Engagement::DiceContest => {
                let attack = dice.roll();
                let defense = dice.roll();
                trace!(%attacker, %defender, attack, defense, "dice contest");
                attack > defense
            }
        }
    }

    /// Resolves `attacker` against `defender` and reports the outcome.
    ///
    /// The result depends only on the two kinds and the dice. The attacker's
    /// observers are notified exactly once, with the actual outcome. Liveness
    /// is neither checked nor changed here; killing the loser is the caller's
    /// decision.
    pub fn resolve(
        &self,
        attacker: &EntityRef,
        defender: &EntityRef,
        dice: &mut dyn DiceSource,
    ) -> bool {
        let won = self.contest(attacker.kind(), defender.kind(), dice);
        attacker.notify_fight(defender, won);
        won
    }

    /// The defender's side of the exchange: accepts a challenge from
    /// `attacker`.
    ///
    /// Returns `false` straight away, with no roll and no notification, if the
    /// defender is already dead. Otherwise defers to
    /// [`resolve`](Self::resolve) and returns whether the defender dies.
    pub fn accept(
        &self,
        defender: &EntityRef,
        attacker: &EntityRef,
        dice: &mut dyn DiceSource,
    ) -> bool {
        if !defender.is_alive() {
            return false;
        }
        self.resolve(attacker, defender, dice)
    }
}
