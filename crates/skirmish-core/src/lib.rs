//! # Skirmish Core
//!
//! Concurrent combat arena core for Skirmish.
//!
//! This crate provides shared-state entities, the kind-pair combat protocol,
//! observer fan-out and two ways of settling fights: a realtime three-thread
//! scheduler and a deterministic batch sweep.
//!
//! ## Architecture
//!
//! - **Entities**: Orks, Squirrels and Druids with guarded position and
//!   liveness, shared as [`entity::EntityRef`]
//! - **Observers**: listeners notified of every concluded fight
//! - **Resolver**: the [`resolver::CombatRules`] table, dice and the fight
//!   channel
//! - **Simulation**: mover, resolver and reporter threads over one arena
//!
//! Collaborators around the core: [`factory`] wires listeners at creation,
//! [`storage`] persists arenas as flat [`record`]s, [`report`] renders
//! [`world_view::WorldView`] snapshots and [`config`] loads run settings.
//!
//! ## Usage
//!
//! ```
//! use skirmish_core::arena::Arena;
//! use skirmish_core::entity::{Entity, EntityKind};
//! use skirmish_core::resolver::{CombatResolver, ScriptedDice};
//!
//! let mut arena = Arena::new();
//! arena.insert(Entity::new(EntityKind::Druid, "elm", 100, 100).into_ref());
//! arena.insert(Entity::new(EntityKind::Squirrel, "nut", 102, 100).into_ref());
//! arena.insert(Entity::new(EntityKind::Squirrel, "acorn", 103, 101).into_ref());
//!
//! let mut dice = ScriptedDice::attacker_always_wins();
//! let dead = CombatResolver::new().sweep(&arena, 5, &mut dice);
//! arena.remove_all(&dead);
//!
//! assert_eq!(dead.len(), 2);
//! assert_eq!(arena.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// Core modules
pub mod arena;
pub mod entity;
pub mod error;
pub mod observers;
pub mod resolver;
pub mod simulation;
pub mod world_view;

// Collaborators
pub mod config;
pub mod factory;
pub mod record;
pub mod report;
pub mod storage;

pub use arena::Arena;
pub use config::SimulationConfig;
pub use entity::{Entity, EntityId, EntityKind, EntityRef};
pub use error::{ConfigError, RecordError, SimulationError, StorageError};
pub use simulation::{RunSummary, RunningSimulation, Simulation};

#[cfg(test)]
mod tests;
