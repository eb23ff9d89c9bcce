//! Entity module: the thread-safe combatant model.
//!
//! This module provides the core entity types for Skirmish:
//! - [`EntityId`]: Process-unique identifier used as reference identity
//! - [`EntityKind`]: The three fixed combatant kinds
//! - [`Entity`]: A combatant whose position and liveness sit behind a lock
//! - [`EntityRef`]: Shared handle to an entity
//! - [`EntitySnapshot`]: A consistent, owned copy of an entity's state
//!
//! # Concurrency
//!
//! Position and liveness live in one `RwLock`-guarded struct, so a reader
//! never observes a torn `(x, y)` pair or a liveness flip in the middle of a
//! decision. Every critical section is a single read or a single
//! read-modify-write; no entity lock is held across a listener callback and
//! no operation holds two entities' locks at once.
//!
//! Entities are shared between the arena, in-flight fight events and observer
//! callbacks, so they are always handled through [`EntityRef`] (`Arc<Entity>`).
//!
//! # Example
//!
//! ```
//! use skirmish_core::entity::{Entity, EntityKind};
//!
//! let ork = Entity::new(EntityKind::Ork, "grub", 0, 0);
//! let druid = Entity::new(EntityKind::Druid, "elm", 3, 4);
//!
//! assert!(ork.is_close(&druid, 5));
//! assert!(!ork.is_close(&druid, 4));
//!
//! ork.move_by(-10, 150, 100, 100);
//! assert_eq!((ork.x(), ork.y()), (0, 100));
//! ```

pub mod profile;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::observers::FightObserver;

pub use profile::{KindProfile, KindProfiles};

/// Shared handle to an entity.
///
/// The arena, queued fight events and observer callbacks all alias the same
/// entity; it is dropped when the last handle goes away.
pub type EntityRef = Arc<Entity>;

// =============================================================================
// EntityId
// =============================================================================

/// Unique identifier for an entity.
///
/// Identity is by reference, never by name: two entities with the same name
/// are different entities. Every [`Entity::new`] call draws a fresh id from a
/// process-wide counter, so ids also give a stable creation order.
///
/// # Example
///
/// ```
/// use skirmish_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Allocates the next unused identifier.
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// =============================================================================
// EntityKind
// =============================================================================

/// Combatant kind.
///
/// Kinds have disjoint combat capabilities; which attacker kind may contest
/// which defender kind is decided by
/// [`CombatRules`](crate::resolver::CombatRules).
///
/// - `Ork`: the aggressor, contests Druids
/// - `Squirrel`: prey, never wins a fight
/// - `Druid`: the mediator, contests Squirrels
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Aggressor.
    Ork,
    /// Prey.
    Squirrel,
    /// Mediator.
    Druid,
}

impl EntityKind {
    /// Every kind, in record-tag order.
    pub const ALL: [Self; 3] = [Self::Ork, Self::Squirrel, Self::Druid];

    /// Integer tag used by the flat record format.
    #[must_use]
    pub const fn tag(self) -> i64 {
        match self {
            Self::Ork => 1,
            Self::Squirrel => 2,
            Self::Druid => 3,
        }
    }

    /// Looks up a kind by its record tag.
    #[must_use]
    pub const fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            1 => Some(Self::Ork),
            2 => Some(Self::Squirrel),
            3 => Some(Self::Druid),
            _ => None,
        }
    }

    /// Single-character map marker.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::Ork => 'O',
            Self::Squirrel => 'S',
            Self::Druid => 'D',
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ork => "Ork",
            Self::Squirrel => "Squirrel",
            Self::Druid => "Druid",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// EntitySnapshot
// =============================================================================

/// An owned copy of one entity's state, taken under a single read lock.
///
/// Snapshots are what reporters and serializers work from: they can be kept,
/// compared and rendered without touching the live entity again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Identity of the entity the snapshot was taken from.
    pub id: EntityId,
    /// Combatant kind.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// Position at the time of the snapshot.
    pub position: IVec2,
    /// Liveness at the time of the snapshot.
    pub alive: bool,
}

// =============================================================================
// Entity
// =============================================================================

/// Mutable state guarded by the entity lock.
#[derive(Debug, Clone, Copy)]
struct EntityState {
    position: IVec2,
    alive: bool,
}

/// A combatant on the map.
///
/// Identity, kind and name are fixed at construction. Position and liveness
/// change concurrently and are only reachable through the guarded accessors.
/// Liveness is monotonic: once [`die`](Self::die) has run, the entity never
/// moves again and is never selected as an attacker or new defender.
///
/// # Listener contract
///
/// [`notify_fight`](Self::notify_fight) runs listeners synchronously on the
/// caller's thread without holding the state lock. A listener may read any
/// entity, but must not call back into a mutating operation on the entity it
/// was notified about while some other code path holds that entity's lock.
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    name: String,
    state: RwLock<EntityState>,
    observers: RwLock<Vec<Arc<dyn FightObserver>>>,
}

impl Entity {
    /// Creates a living entity at `(x, y)` with no listeners.
    ///
    /// Coordinates are taken as given, negative values included; they are
    /// only clamped once the entity moves.
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            id: EntityId::next(),
            kind,
            name: name.into(),
            state: RwLock::new(EntityState {
                position: IVec2::new(x, y),
                alive: true,
            }),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Wraps the entity in a shared handle.
    #[must_use]
    pub fn into_ref(self) -> EntityRef {
        Arc::new(self)
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the entity's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn read_state(&self) -> RwLockReadGuard<'_, EntityState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, EntityState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current position.
    #[must_use]
    pub fn position(&self) -> IVec2 {
        self.read_state().position
    }

    /// Returns the current x coordinate.
    #[must_use]
    pub fn x(&self) -> i32 {
        self.position().x
    }

    /// Returns the current y coordinate.
    #[must_use]
    pub fn y(&self) -> i32 {
        self.position().y
    }

    /// Shifts the entity by `(dx, dy)` and clamps each axis into `[0, max]`.
    ///
    /// Does nothing on a dead entity. A negative bound is treated as `0`.
    pub fn move_by(&self, dx: i32, dy: i32, max_x: i32, max_y: i32) {
        let mut state = self.write_state();
        if !state.alive {
            return;
        }
        state.position = IVec2::new(
            state.position.x.saturating_add(dx).clamp(0, max_x.max(0)),
            state.position.y.saturating_add(dy).clamp(0, max_y.max(0)),
        );
    }

    /// Returns `true` while the entity has not died.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.read_state().alive
    }

    /// Marks the entity dead. Idempotent.
    pub fn die(&self) {
        self.write_state().alive = false;
    }

    /// Returns `true` if both entities are alive and no further apart than
    /// `distance`.
    ///
    /// The comparison is `dx² + dy² <= distance²` in integer arithmetic, so
    /// the boundary is inclusive and no floating point is involved. It is
    /// symmetric in its two operands. Each entity's state is read under its
    /// own lock in turn; the two locks are never held together.
    #[must_use]
    pub fn is_close(&self, other: &Entity, distance: u32) -> bool {
        let (here, alive) = {
            let state = self.read_state();
            (state.position, state.alive)
        };
        if !alive {
            return false;
        }
        let (there, other_alive) = {
            let state = other.read_state();
            (state.position, state.alive)
        };
        if !other_alive {
            return false;
        }

        let dx = i128::from(here.x) - i128::from(there.x);
        let dy = i128::from(here.y) - i128::from(there.y);
        let reach = i128::from(distance);
        dx * dx + dy * dy <= reach * reach
    }

    /// Appends a listener. Listeners only hear about fights concluded after
    /// they subscribe.
    pub fn subscribe(&self, observer: Arc<dyn FightObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Returns the number of subscribed listeners.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Reports a concluded fight, with `self` as the attacker, to every
    /// listener in subscription order.
    ///
    /// The listener list is copied out of its lock first, so listeners run
    /// with no entity lock held.
    pub fn notify_fight(self: &Arc<Self>, defender: &EntityRef, won: bool) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer.on_fight(self, defender, won);
        }
    }

    /// Takes a consistent snapshot of the entity.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        let state = *self.read_state();
        EntitySnapshot {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            position: state.position,
            alive: state.alive,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = *self.read_state();
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("position", &state.position)
            .field("alive", &state.alive)
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = self.position();
        write!(
            f,
            "{} {} {{{}, {}}}",
            self.kind, self.name, position.x, position.y
        )
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
