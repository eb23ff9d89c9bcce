//! Fight events and the channel that carries them.
//!
//! The mover task discovers fights and the resolver task settles them; the
//! [`FightChannel`] sits in between. It is an unbounded multi-producer queue
//! with blocking consumption and a one-way shutdown:
//!
//! ```text
//! Open ──request_stop()──▶ StopRequested ──backlog empty──▶ Drained
//! ```
//!
//! - `Open`: pushes are queued, pops block until an event arrives.
//! - `StopRequested`: pushes are dropped, pops still return queued events.
//! - `Drained`: every pop returns `None` immediately.
//!
//! Stopping means "no new fights", never "discard pending fights": the
//! consumer always drains the backlog before it sees end-of-stream.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::entity::EntityRef;

/// A pending `(attacker, defender)` pair.
///
/// Events hold shared handles, so the entities stay valid while queued. By
/// the time an event is consumed either side may have died or moved away;
/// the consumer must re-validate before acting.
#[derive(Clone)]
pub struct FightEvent {
    /// The entity that initiates the fight.
    pub attacker: EntityRef,
    /// The entity being attacked.
    pub defender: EntityRef,
}

impl FightEvent {
    /// Pairs an attacker with a defender.
    #[must_use]
    pub fn new(attacker: EntityRef, defender: EntityRef) -> Self {
        Self { attacker, defender }
    }
}

impl fmt::Debug for FightEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FightEvent")
            .field("attacker", &self.attacker.id())
            .field("defender", &self.defender.id())
            .finish()
    }
}

/// Lifecycle of a [`FightChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Accepting events.
    Open,
    /// Rejecting new events, still holding a backlog.
    StopRequested,
    /// Stopped with an empty backlog.
    Drained,
}

#[derive(Debug, Default)]
struct Queue {
    events: VecDeque<FightEvent>,
    stopped: bool,
}

/// Blocking fight queue with graceful shutdown.
///
/// # Example
///
/// ```
/// use skirmish_core::entity::{Entity, EntityKind};
/// use skirmish_core::resolver::{ChannelState, FightChannel, FightEvent};
///
/// let channel = FightChannel::new();
/// let ork = Entity::new(EntityKind::Ork, "grub", 0, 0).into_ref();
/// let druid = Entity::new(EntityKind::Druid, "elm", 1, 1).into_ref();
///
/// assert!(channel.push(FightEvent::new(ork.clone(), druid.clone())));
/// channel.request_stop();
/// assert!(!channel.push(FightEvent::new(ork, druid)));
///
/// assert_eq!(channel.state(), ChannelState::StopRequested);
/// assert!(channel.pop().is_some());
/// assert!(channel.pop().is_none());
/// assert_eq!(channel.state(), ChannelState::Drained);
/// ```
#[derive(Debug, Default)]
pub struct FightChannel {
    queue: Mutex<Queue>,
    ready: Condvar,
}

impl FightChannel {
    /// Creates an open, empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues an event and wakes one waiting consumer.
    ///
    /// Returns `false`, dropping the event, once a stop has been requested.
    pub fn push(&self, event: FightEvent) -> bool {
        let mut queue = self.lock();
        if queue.stopped {
            return false;
        }
        queue.events.push_back(event);
        drop(queue);
        self.ready.notify_one();
        true
    }

    /// Takes the next event, blocking while the channel is open and empty.
    ///
    /// Returns `None` only once the channel is stopped and drained.
    pub fn pop(&self) -> Option<FightEvent> {
        let queue = self.lock();
        let mut queue = self
            .ready
            .wait_while(queue, |queue| !queue.stopped && queue.events.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        queue.events.pop_front()
    }

    /// Takes the next event if one is queued, without blocking.
    pub fn try_pop(&self) -> Option<FightEvent> {
        self.lock().events.pop_front()
    }

    /// Stops accepting events and wakes every consumer. Idempotent.
    pub fn request_stop(&self) {
        self.lock().stopped = true;
        self.ready.notify_all();
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        let queue = self.lock();
        match (queue.stopped, queue.events.is_empty()) {
            (false, _) => ChannelState::Open,
            (true, false) => ChannelState::StopRequested,
            (true, true) => ChannelState::Drained,
        }
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    /// Returns `true` if no event is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }
}
