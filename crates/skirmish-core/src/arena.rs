//! Arena module: the ordered roster of entities taking part in a skirmish.
//!
//! The Arena owns shared handles ([`EntityRef`]) in insertion order. Order
//! matters: the batch sweep and the mover's fight discovery both walk the
//! roster front to back, so the same roster and the same dice always produce
//! the same outcome.
//!
//! # Architecture
//!
//! - Entities live in a `Vec<EntityRef>` that fixes iteration order.
//! - A `HashMap<EntityId, usize>` indexes positions in that vector for
//!   constant-time membership and lookup.
//! - Entity state (position, liveness) is interior to each [`Entity`]; the
//!   roster itself only changes on insert and remove. A running simulation
//!   shares the roster read-only behind an `Arc`.
//!
//! Dead entities stay in the roster until removed explicitly, e.g. with
//! [`Arena::remove_all`] after a sweep.
//!
//! # Example
//!
//! ```
//! use skirmish_core::arena::Arena;
//! use skirmish_core::entity::{Entity, EntityKind};
//!
//! let mut arena = Arena::new();
//! let ork = Entity::new(EntityKind::Ork, "grub", 10, 20).into_ref();
//! assert!(arena.insert(ork.clone()));
//! assert!(!arena.insert(ork.clone()));
//!
//! assert_eq!(arena.len(), 1);
//! assert!(arena.name_exists("grub"));
//! assert_eq!(arena.get(ork.id()).map(|e| e.name()), Some("grub"));
//! ```
//!
//! [`Entity`]: crate::entity::Entity

use std::collections::{HashMap, HashSet};
use std::slice;

use crate::entity::{EntityId, EntityKind, EntityRef};

// =============================================================================
// Arena
// =============================================================================

/// Insertion-ordered collection of shared entities.
#[derive(Debug, Default, Clone)]
pub struct Arena {
    /// Entities in iteration order.
    entities: Vec<EntityRef>,
    /// Position of each entity in `entities`.
    index: HashMap<EntityId, usize>,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty arena with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Appends an entity to the roster.
    ///
    /// Returns `false` and leaves the roster unchanged if an entity with the
    /// same id is already present.
    pub fn insert(&mut self, entity: EntityRef) -> bool {
        let id = entity.id();
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
        true
    }

    /// Number of entities in the roster, alive or dead.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the roster holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates over the roster in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, EntityRef> {
        self.entities.iter()
    }

    /// The roster as a slice, in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[EntityRef] {
        &self.entities
    }

    /// Looks an entity up by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntityRef> {
        self.index.get(&id).map(|&slot| &self.entities[slot])
    }

    /// Returns `true` if an entity with this id is in the roster.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Returns `true` if any entity, alive or dead, carries this name.
    #[must_use]
    pub fn name_exists(&self, name: &str) -> bool {
        self.entities.iter().any(|entity| entity.name() == name)
    }

    /// Iterates over the entities that are still alive.
    pub fn living(&self) -> impl Iterator<Item = &EntityRef> + '_ {
        self.entities.iter().filter(|entity| entity.is_alive())
    }

    /// Number of living entities.
    #[must_use]
    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    /// Number of living entities of one kind.
    #[must_use]
    pub fn living_of_kind(&self, kind: EntityKind) -> usize {
        self.living().filter(|entity| entity.kind() == kind).count()
    }

    /// Removes one entity by id, preserving the order of the rest.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityRef> {
        let slot = self.index.remove(&id)?;
        let removed = self.entities.remove(slot);
        self.reindex_from(slot);
        Some(removed)
    }

    /// Removes every listed entity that is in the roster.
    ///
    /// Returns how many were removed. Order of the survivors is preserved.
    pub fn remove_all(&mut self, dead: &[EntityRef]) -> usize {
        let doomed: HashSet<EntityId> = dead
            .iter()
            .map(|entity| entity.id())
            .filter(|id| self.index.contains_key(id))
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        self.entities.retain(|entity| !doomed.contains(&entity.id()));
        self.index.clear();
        self.reindex_from(0);
        doomed.len()
    }

    fn reindex_from(&mut self, start: usize) {
        for (slot, entity) in self.entities.iter().enumerate().skip(start) {
            self.index.insert(entity.id(), slot);
        }
    }
}

impl<'a> IntoIterator for &'a Arena {
    type Item = &'a EntityRef;
    type IntoIter = slice::Iter<'a, EntityRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl Extend<EntityRef> for Arena {
    fn extend<I: IntoIterator<Item = EntityRef>>(&mut self, iter: I) {
        for entity in iter {
            self.insert(entity);
        }
    }
}

impl FromIterator<EntityRef> for Arena {
    fn from_iter<I: IntoIterator<Item = EntityRef>>(iter: I) -> Self {
        let mut arena = Self::new();
        arena.extend(iter);
        arena
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    fn entity(kind: EntityKind, name: &str) -> EntityRef {
        Entity::new(kind, name, 0, 0).into_ref()
    }

    mod roster_tests {
        use super::*;

        #[test]
        fn new_arena_is_empty() {
            let arena = Arena::new();
            assert!(arena.is_empty());
            assert_eq!(arena.len(), 0);
            assert_eq!(arena.living_count(), 0);
        }

        #[test]
        fn insert_keeps_order() {
            let mut arena = Arena::with_capacity(3);
            for name in ["a", "b", "c"] {
                arena.insert(entity(EntityKind::Ork, name));
            }
            let names: Vec<&str> = arena.iter().map(|e| e.name()).collect();
            assert_eq!(names, vec!["a", "b", "c"]);
        }

        #[test]
        fn duplicate_insert_is_rejected() {
            let mut arena = Arena::new();
            let ork = entity(EntityKind::Ork, "a");
            assert!(arena.insert(ork.clone()));
            assert!(!arena.insert(ork));
            assert_eq!(arena.len(), 1);
        }

        #[test]
        fn same_name_different_entity_is_allowed() {
            let mut arena = Arena::new();
            assert!(arena.insert(entity(EntityKind::Ork, "twin")));
            assert!(arena.insert(entity(EntityKind::Druid, "twin")));
            assert_eq!(arena.len(), 2);
        }

        #[test]
        fn name_exists_checks_every_entity() {
            let mut arena = Arena::new();
            let dead = entity(EntityKind::Squirrel, "gone");
            dead.die();
            arena.insert(dead);

            assert!(arena.name_exists("gone"));
            assert!(!arena.name_exists("present"));
        }

        #[test]
        fn living_filters_the_dead() {
            let mut arena = Arena::new();
            let alive = entity(EntityKind::Druid, "alive");
            let dead = entity(EntityKind::Druid, "dead");
            dead.die();
            arena.insert(alive.clone());
            arena.insert(dead);

            let living: Vec<EntityId> = arena.living().map(|e| e.id()).collect();
            assert_eq!(living, vec![alive.id()]);
            assert_eq!(arena.living_of_kind(EntityKind::Druid), 1);
            assert_eq!(arena.living_of_kind(EntityKind::Ork), 0);
        }

        #[test]
        fn collect_and_extend() {
            let mut arena: Arena = ["a", "b"]
                .into_iter()
                .map(|n| entity(EntityKind::Ork, n))
                .collect();
            arena.extend(std::iter::once(entity(EntityKind::Ork, "c")));
            assert_eq!(arena.len(), 3);
        }
    }

    mod removal_tests {
        use super::*;

        #[test]
        fn remove_preserves_order_and_index() {
            let mut arena = Arena::new();
            let a = entity(EntityKind::Ork, "a");
            let b = entity(EntityKind::Ork, "b");
            let c = entity(EntityKind::Ork, "c");
            for e in [&a, &b, &c] {
                arena.insert(e.clone());
            }

            let removed = arena.remove(b.id());
            assert_eq!(removed.map(|e| e.id()), Some(b.id()));
            assert!(!arena.contains(b.id()));
            assert_eq!(arena.get(c.id()).map(|e| e.id()), Some(c.id()));
            assert_eq!(arena.as_slice()[1].id(), c.id());
            assert!(arena.remove(b.id()).is_none());
        }

        #[test]
        fn remove_all_skips_strangers() {
            let mut arena = Arena::new();
            let a = entity(EntityKind::Ork, "a");
            let b = entity(EntityKind::Squirrel, "b");
            let c = entity(EntityKind::Druid, "c");
            for e in [&a, &b, &c] {
                arena.insert(e.clone());
            }
            let stranger = entity(EntityKind::Ork, "x");

            let removed = arena.remove_all(&[a.clone(), stranger, c.clone()]);
            assert_eq!(removed, 2);
            assert_eq!(arena.len(), 1);
            assert_eq!(arena.get(b.id()).map(|e| e.name()), Some("b"));
            assert!(arena.get(a.id()).is_none());
        }

        #[test]
        fn remove_all_with_nothing_is_noop() {
            let mut arena = Arena::new();
            arena.insert(entity(EntityKind::Ork, "a"));
            assert_eq!(arena.remove_all(&[]), 0);
            assert_eq!(arena.len(), 1);
        }
    }
}
