//! `WorldView` is a point-in-time, read-only picture of the arena.
//!
//! Reporters never touch live entities. They receive a [`WorldView`] built
//! from one [`EntitySnapshot`] per entity, each taken under that entity's own
//! read lock. The view as a whole is not atomic: entities keep moving while it
//! is captured, so two snapshots in the same view may come from slightly
//! different moments. Every individual snapshot is internally consistent.
//!
//! # Example
//!
//! ```
//! use skirmish_core::arena::Arena;
//! use skirmish_core::entity::{Entity, EntityKind};
//! use skirmish_core::world_view::WorldView;
//!
//! let mut arena = Arena::new();
//! arena.insert(Entity::new(EntityKind::Ork, "grub", 1, 2).into_ref());
//! let druid = Entity::new(EntityKind::Druid, "elm", 3, 4).into_ref();
//! druid.die();
//! arena.insert(druid);
//!
//! let view = WorldView::capture(&arena, 7);
//! assert_eq!(view.tick(), 7);
//! assert_eq!(view.entities().len(), 2);
//! assert_eq!(view.living().count(), 1);
//! assert_eq!(view.count_of(EntityKind::Ork), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::{EntityKind, EntitySnapshot};

// =============================================================================
// WorldView
// =============================================================================

/// Snapshots of every entity in the arena, tagged with the mover tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldView {
    tick: u64,
    entities: Vec<EntitySnapshot>,
}

impl WorldView {
    /// Snapshots every entity of `arena` in roster order.
    #[must_use]
    pub fn capture(arena: &Arena, tick: u64) -> Self {
        Self {
            tick,
            entities: arena.iter().map(|entity| entity.snapshot()).collect(),
        }
    }

    /// Builds a view from snapshots taken elsewhere.
    #[must_use]
    pub fn from_snapshots(tick: u64, entities: Vec<EntitySnapshot>) -> Self {
        Self { tick, entities }
    }

    /// Mover tick the view was captured at.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// All snapshots, dead entities included, in roster order.
    #[must_use]
    pub fn entities(&self) -> &[EntitySnapshot] {
        &self.entities
    }

    /// Snapshots of the entities that were alive when captured.
    pub fn living(&self) -> impl Iterator<Item = &EntitySnapshot> + '_ {
        self.entities.iter().filter(|snapshot| snapshot.alive)
    }

    /// Living entities of one kind.
    #[must_use]
    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.living().filter(|snapshot| snapshot.kind == kind).count()
    }

    /// Living entities per kind, in [`EntityKind::ALL`] order.
    #[must_use]
    pub fn count_by_kind(&self) -> [(EntityKind, usize); 3] {
        EntityKind::ALL.map(|kind| (kind, self.count_of(kind)))
    }

    /// Serializes the view as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Tests
// =============================================================================
