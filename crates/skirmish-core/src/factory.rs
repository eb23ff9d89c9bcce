//! Entity construction with listener wiring.
//!
//! Every entity that enters an arena goes through this module so it starts
//! life subscribed to the run's observers, in the order given.

use rand::Rng;
use tracing::debug;

use crate::arena::Arena;
use crate::config::MapConfig;
use crate::entity::{Entity, EntityKind, EntityRef};
use crate::error::RecordError;
use crate::observers::Observers;
use crate::record::Record;

/// Creates a living entity and subscribes every listener to it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use skirmish_core::entity::EntityKind;
/// use skirmish_core::factory;
/// use skirmish_core::observers::{FightObserver, KillCounter};
///
/// let counter = Arc::new(KillCounter::new());
/// let observers: Vec<Arc<dyn FightObserver>> = vec![counter];
/// let ork = factory::create(EntityKind::Ork, "grub", 1, 2, &observers);
///
/// assert_eq!(ork.observer_count(), 1);
/// assert_eq!(ork.to_string(), "Ork grub {1, 2}");
/// ```
#[must_use]
pub fn create(
    kind: EntityKind,
    name: impl Into<String>,
    x: i32,
    y: i32,
    observers: &Observers,
) -> EntityRef {
    let entity = Entity::new(kind, name, x, y).into_ref();
    for observer in observers {
        entity.subscribe(observer.clone());
    }
    entity
}

/// Creates an entity from a parsed record.
#[must_use]
pub fn create_from(record: Record, observers: &Observers) -> EntityRef {
    create(
        record.kind,
        record.name,
        record.position.x,
        record.position.y,
        observers,
    )
}

/// Parses one record line and creates the entity it describes.
///
/// # Errors
///
/// Returns the [`RecordError`] from [`Record::parse`]; nothing is created.
pub fn create_from_record(line: &str, observers: &Observers) -> Result<EntityRef, RecordError> {
    Record::parse(line).map(|record| create_from(record, observers))
}

/// Fills a fresh arena with `count` random entities.
///
/// Kinds are uniform, positions uniform over the map. Names are `npc_<i>`,
/// bumped with a suffix in the unlikely case the name is already taken, so
/// every name in the result is unique.
pub fn populate<R: Rng>(
    rng: &mut R,
    map: &MapConfig,
    observers: &Observers,
    count: usize,
) -> Arena {
    let mut arena = Arena::with_capacity(count);
    for i in 0..count {
        let kind = EntityKind::ALL[rng.gen_range(0..EntityKind::ALL.len())];
        let x = rng.gen_range(0..map.width.max(1));
        let y = rng.gen_range(0..map.height.max(1));

        let mut name = format!("npc_{i}");
        let mut bump = 0_u32;
        while arena.name_exists(&name) {
            bump += 1;
            name = format!("npc_{i}_{bump}");
        }

        arena.insert(create(kind, name, x, y, observers));
    }
    debug!(count, "arena populated");
    arena
}
