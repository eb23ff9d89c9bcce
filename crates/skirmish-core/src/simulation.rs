//! Realtime scheduler: three threads sharing one arena.
//!
//! A running simulation is three cooperating tasks:
//!
//! 1. **Mover**: every `move_tick`, shifts each living entity by a random
//!    amount within its kind's step, clamped to the map, then scans every
//!    `(attacker, defender)` pair and queues a [`FightEvent`] for each one
//!    that is eligible under the rule table and within the attacker kind's
//!    kill distance.
//! 2. **Resolver**: pops events until end-of-stream. Each event is
//!    re-validated (both alive, pair still eligible) because the world moved
//!    on since it was queued; stale events are discarded and counted. Live
//!    events go through [`CombatResolver::resolve`], and an attacker win
//!    kills the defender.
//! 3. **Reporter**: every `report_tick`, hands a [`WorldView`] to a
//!    [`Reporter`]. It never mutates anything.
//!
//! Resolution is one-directional: only the queued attacker can win. The
//! batch alternative is [`CombatResolver::sweep`].
//!
//! # Shutdown
//!
//! [`RunningSimulation::stop`] raises the stop flag and wakes the sleepers.
//! The mover finishes its tick and closes the channel; the resolver drains
//! whatever was already queued and exits on end-of-stream; the reporter
//! exits at its next check. Every fight queued before the stop is resolved
//! or counted stale, so `events_queued == fights_resolved + stale`.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use skirmish_core::arena::Arena;
//! use skirmish_core::config::SimulationConfig;
//! use skirmish_core::entity::{Entity, EntityKind};
//! use skirmish_core::simulation::Simulation;
//! use skirmish_core::world_view::WorldView;
//!
//! let mut arena = Arena::new();
//! arena.insert(Entity::new(EntityKind::Ork, "grub", 50, 50).into_ref());
//! arena.insert(Entity::new(EntityKind::Druid, "elm", 52, 50).into_ref());
//!
//! let config = SimulationConfig {
//!     seed: Some(1),
//!     move_tick_ms: 1,
//!     report_tick_ms: 5,
//!     ..SimulationConfig::default()
//! };
//! let sim = Simulation::new(arena, config).unwrap();
//! let summary = sim.run_for(Duration::from_millis(30), |_: &WorldView| {}).unwrap();
//!
//! assert!(summary.ticks > 0);
//! assert_eq!(summary.events_queued, summary.fights_resolved + summary.stale);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, error, trace};

use crate::arena::Arena;
use crate::config::{MapConfig, SimulationConfig};
use crate::entity::KindProfiles;
use crate::error::{ConfigError, SimulationError};
use crate::report::Reporter;
use crate::resolver::{task_seed, CombatResolver, Dice, DiceSource, FightChannel, FightEvent};
use crate::world_view::WorldView;

/// Stream index of the mover's random source.
const MOVER_STREAM: u64 = 0;
/// Stream index of the resolver's dice.
const RESOLVER_STREAM: u64 = 1;

// =============================================================================
// Simulation
// =============================================================================

/// A configured arena, ready to run.
#[derive(Debug)]
pub struct Simulation {
    arena: Arc<Arena>,
    config: SimulationConfig,
    combat: Arc<CombatResolver>,
}

impl Simulation {
    /// Wraps an arena with a validated configuration and the standard rules.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] from [`SimulationConfig::validate`].
    pub fn new(arena: Arena, config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            arena: Arc::new(arena),
            config,
            combat: Arc::new(CombatResolver::new()),
        })
    }

    /// Replaces the combat rules.
    #[must_use]
    pub fn with_combat(mut self, combat: CombatResolver) -> Self {
        self.combat = Arc::new(combat);
        self
    }

    /// The shared roster.
    #[must_use]
    pub fn arena(&self) -> &Arc<Arena> {
        &self.arena
    }

    /// The configuration this simulation runs with.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The combat rules shared by every task.
    #[must_use]
    pub fn combat(&self) -> &CombatResolver {
        &self.combat
    }

    /// Builds a mover seeded from the master seed, or from OS entropy.
    #[must_use]
    pub fn mover(&self) -> Mover {
        let rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(task_seed(seed, MOVER_STREAM)),
            None => ChaCha8Rng::from_entropy(),
        };
        Mover::new(
            Arc::clone(&self.arena),
            Arc::clone(&self.combat),
            &self.config,
            rng,
        )
    }

    /// Builds a resolver with dice seeded from the master seed, or from OS
    /// entropy.
    #[must_use]
    pub fn fight_resolver(&self) -> FightResolver<Dice> {
        let dice = match self.config.seed {
            Some(seed) => Dice::seeded(task_seed(seed, RESOLVER_STREAM)),
            None => Dice::from_entropy(),
        };
        self.fight_resolver_with(dice)
    }

    /// Builds a resolver rolling the given dice.
    #[must_use]
    pub fn fight_resolver_with<D: DiceSource>(&self, dice: D) -> FightResolver<D> {
        FightResolver::new(Arc::clone(&self.combat), dice)
    }

    /// Starts the three scheduler threads with the configured dice.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Spawn`] if a thread cannot be started. Threads
    /// already running are stopped and joined before returning.
    pub fn start<R>(&self, reporter: R) -> Result<RunningSimulation, SimulationError>
    where
        R: Reporter + 'static,
    {
        self.start_with(reporter, self.fight_resolver())
    }

    /// Starts the three scheduler threads with a caller-supplied resolver.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub fn start_with<R, D>(
        &self,
        reporter: R,
        resolver: FightResolver<D>,
    ) -> Result<RunningSimulation, SimulationError>
    where
        R: Reporter + 'static,
        D: DiceSource + Send + 'static,
    {
        let mover = self.mover();
        let mut running = RunningSimulation {
            arena: Arc::clone(&self.arena),
            stop: Arc::new(AtomicBool::new(false)),
            channel: Arc::new(FightChannel::new()),
            ticks: mover.tick_counter(),
            started: Instant::now(),
            mover: None,
            resolver: None,
            reporter: None,
        };

        let channel = Arc::clone(&running.channel);
        running.resolver = Some(spawn("skirmish-resolver", move || resolver.run(&channel))?);

        let channel = Arc::clone(&running.channel);
        let stop = Arc::clone(&running.stop);
        let move_tick = self.config.move_tick();
        running.mover = Some(spawn("skirmish-mover", move || {
            mover.run(&channel, &stop, move_tick)
        })?);

        let arena = Arc::clone(&self.arena);
        let stop = Arc::clone(&running.stop);
        let ticks = Arc::clone(&running.ticks);
        let report_tick = self.config.report_tick();
        running.reporter = Some(spawn("skirmish-reporter", move || {
            report_loop(reporter, &arena, &stop, &ticks, report_tick)
        })?);

        debug!(
            entities = self.arena.len(),
            move_tick_ms = self.config.move_tick_ms,
            report_tick_ms = self.config.report_tick_ms,
            "simulation started"
        );
        Ok(running)
    }

    /// Runs for `duration`, then stops and returns the summary.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub fn run_for<R>(
        &self,
        duration: Duration,
        reporter: R,
    ) -> Result<RunSummary, SimulationError>
    where
        R: Reporter + 'static,
    {
        let running = self.start(reporter)?;
        thread::sleep(duration);
        Ok(running.stop())
    }
}

fn spawn<T, F>(name: &'static str, task: F) -> Result<JoinHandle<T>, SimulationError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(task)
        .map_err(|source| SimulationError::Spawn {
            thread: name,
            source,
        })
}

/// Sleeps until `duration` has passed or `stop` is raised.
///
/// Parks rather than sleeps so that [`RunningSimulation::stop`] can wake the
/// thread at once.
fn pause(stop: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;
    while !stop.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::park_timeout(deadline - now);
    }
}

fn report_loop<R: Reporter>(
    mut reporter: R,
    arena: &Arena,
    stop: &AtomicBool,
    ticks: &AtomicU64,
    cadence: Duration,
) -> usize {
    let mut reports = 0;
    while !stop.load(Ordering::Acquire) {
        reporter.report(&WorldView::capture(arena, ticks.load(Ordering::Acquire)));
        reports += 1;
        pause(stop, cadence);
    }
    reports
}

// =============================================================================
// Mover
// =============================================================================

/// Counters from one mover run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoverStats {
    /// Completed mover ticks.
    pub ticks: u64,
    /// Events the channel accepted.
    pub queued: usize,
}

/// Moves entities and discovers fights.
#[derive(Debug)]
pub struct Mover {
    arena: Arc<Arena>,
    combat: Arc<CombatResolver>,
    map: MapConfig,
    profiles: KindProfiles,
    rng: ChaCha8Rng,
    ticks: Arc<AtomicU64>,
}

impl Mover {
    /// Creates a mover over `arena` with its own random stream.
    #[must_use]
    pub fn new(
        arena: Arc<Arena>,
        combat: Arc<CombatResolver>,
        config: &SimulationConfig,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            arena,
            combat,
            map: config.map,
            profiles: config.profiles,
            rng,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Completed ticks.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Shared handle to the tick counter, for readers on other threads.
    #[must_use]
    pub fn tick_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.ticks)
    }

    /// Shifts every living entity by a random step, clamped to the map.
    pub fn move_all(&mut self) {
        for entity in self.arena.living() {
            let step = self.profiles.get(entity.kind()).step.max(0);
            let dx = self.rng.gen_range(-step..=step);
            let dy = self.rng.gen_range(-step..=step);
            entity.move_by(dx, dy, self.map.width, self.map.height);
        }
    }

    /// Lists every eligible in-range pair, attackers in roster order.
    ///
    /// Attackers are scanned in parallel; the result is in the same order a
    /// sequential scan would give.
    #[must_use]
    pub fn discover(&self) -> Vec<FightEvent> {
        let roster = self.arena.as_slice();
        let combat = &*self.combat;
        let profiles = &self.profiles;

        let per_attacker: Vec<Vec<FightEvent>> = roster
            .par_iter()
            .map(|attacker| {
                if !attacker.is_alive() {
                    return Vec::new();
                }
                let reach = profiles.get(attacker.kind()).kill_distance;
                roster
                    .iter()
                    .filter(|defender| {
                        defender.id() != attacker.id()
                            && combat.can_attack(attacker, defender)
                            && attacker.is_close(defender, reach)
                    })
                    .map(|defender| FightEvent::new(Arc::clone(attacker), Arc::clone(defender)))
                    .collect()
            })
            .collect();

        per_attacker.into_iter().flatten().collect()
    }

    /// Runs one tick: move, discover, queue. Returns how many events the
    /// channel accepted.
    pub fn step(&mut self, channel: &FightChannel) -> usize {
        self.move_all();
        let mut queued = 0;
        for event in self.discover() {
            if channel.push(event) {
                queued += 1;
            }
        }
        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(tick, queued, "mover tick");
        queued
    }

    /// Ticks every `cadence` until `stop` is raised, then closes `channel`.
    pub fn run(
        mut self,
        channel: &FightChannel,
        stop: &AtomicBool,
        cadence: Duration,
    ) -> MoverStats {
        let mut queued = 0;
        while !stop.load(Ordering::Acquire) {
            queued += self.step(channel);
            pause(stop, cadence);
        }
        channel.request_stop();
        let stats = MoverStats {
            ticks: self.ticks(),
            queued,
        };
        debug!(ticks = stats.ticks, queued = stats.queued, "mover stopped");
        stats
    }
}

// =============================================================================
// FightResolver
// =============================================================================

/// What happened to one queued event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// One side was already dead or the pair is no longer eligible.
    Stale,
    /// The attacker won and the defender is now dead.
    AttackerWon,
    /// The defender survived.
    DefenderHeld,
}

/// Counters from one resolver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Events that reached the combat protocol.
    pub resolved: usize,
    /// Defenders killed.
    pub kills: usize,
    /// Events discarded on re-validation.
    pub stale: usize,
}

/// Consumes fight events and applies their outcome.
#[derive(Debug)]
pub struct FightResolver<D> {
    combat: Arc<CombatResolver>,
    dice: D,
    stats: ResolverStats,
}

impl<D: DiceSource> FightResolver<D> {
    /// Creates a resolver rolling `dice` against `combat`'s rules.
    #[must_use]
    pub fn new(combat: Arc<CombatResolver>, dice: D) -> Self {
        Self {
            combat,
            dice,
            stats: ResolverStats::default(),
        }
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Re-validates and resolves one event.
    pub fn handle(&mut self, event: &FightEvent) -> Resolution {
        let FightEvent { attacker, defender } = event;
        if !attacker.is_alive()
            || !defender.is_alive()
            || !self.combat.can_attack(attacker, defender)
        {
            self.stats.stale += 1;
            trace!(?event, "stale fight discarded");
            return Resolution::Stale;
        }

        self.stats.resolved += 1;
        if self.combat.resolve(attacker, defender, &mut self.dice) {
            defender.die();
            self.stats.kills += 1;
            Resolution::AttackerWon
        } else {
            Resolution::DefenderHeld
        }
    }

    /// Handles every event queued right now without blocking. Returns how
    /// many were handled.
    pub fn drain(&mut self, channel: &FightChannel) -> usize {
        let mut handled = 0;
        while let Some(event) = channel.try_pop() {
            self.handle(&event);
            handled += 1;
        }
        handled
    }

    /// Handles events until the channel reports end-of-stream.
    pub fn run(mut self, channel: &FightChannel) -> ResolverStats {
        while let Some(event) = channel.pop() {
            self.handle(&event);
        }
        debug!(
            resolved = self.stats.resolved,
            kills = self.stats.kills,
            stale = self.stats.stale,
            "resolver drained"
        );
        self.stats
    }
}

// =============================================================================
// RunningSimulation
// =============================================================================

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Completed mover ticks.
    pub ticks: u64,
    /// Fight events accepted by the channel.
    pub events_queued: usize,
    /// Events that reached the combat protocol.
    pub fights_resolved: usize,
    /// Defenders killed by the resolver.
    pub kills: usize,
    /// Events discarded as stale.
    pub stale: usize,
    /// Snapshots delivered to the reporter.
    pub reports: usize,
    /// Wall-clock run time.
    pub elapsed: Duration,
    /// The arena after every thread has stopped.
    pub final_view: WorldView,
}

/// Handle to a started simulation.
///
/// Dropping the handle stops the simulation as [`stop`](Self::stop) would,
/// discarding the summary.
#[derive(Debug)]
pub struct RunningSimulation {
    arena: Arc<Arena>,
    stop: Arc<AtomicBool>,
    channel: Arc<FightChannel>,
    ticks: Arc<AtomicU64>,
    started: Instant,
    mover: Option<JoinHandle<MoverStats>>,
    resolver: Option<JoinHandle<ResolverStats>>,
    reporter: Option<JoinHandle<usize>>,
}

impl RunningSimulation {
    /// Completed mover ticks so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Time since start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fight events waiting for the resolver.
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.channel.len()
    }

    /// Stops every task, waits for the resolver to drain and summarizes.
    #[must_use]
    pub fn stop(mut self) -> RunSummary {
        self.shutdown()
    }

    fn shutdown(&mut self) -> RunSummary {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = &self.mover {
            handle.thread().unpark();
        }
        if let Some(handle) = &self.reporter {
            handle.thread().unpark();
        }

        let mover = join(self.mover.take(), "mover");
        // The mover closes the channel on exit; repeat it in case it panicked.
        self.channel.request_stop();
        let resolver = join(self.resolver.take(), "resolver");
        let reports = join(self.reporter.take(), "reporter");

        let summary = RunSummary {
            ticks: mover.ticks,
            events_queued: mover.queued,
            fights_resolved: resolver.resolved,
            kills: resolver.kills,
            stale: resolver.stale,
            reports,
            elapsed: self.started.elapsed(),
            final_view: WorldView::capture(&self.arena, mover.ticks),
        };
        debug!(
            ticks = summary.ticks,
            queued = summary.events_queued,
            resolved = summary.fights_resolved,
            kills = summary.kills,
            stale = summary.stale,
            "simulation stopped"
        );
        summary
    }
}

impl Drop for RunningSimulation {
    fn drop(&mut self) {
        if self.mover.is_some() || self.resolver.is_some() || self.reporter.is_some() {
            let _ = self.shutdown();
        }
    }
}

fn join<T: Default>(handle: Option<JoinHandle<T>>, task: &'static str) -> T {
    match handle.map(JoinHandle::join) {
        Some(Ok(value)) => value,
        Some(Err(_)) => {
            error!(task, "scheduler thread panicked");
            T::default()
        }
        None => T::default(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::entity::{Entity, EntityKind, EntityRef, KindProfile};
    use crate::observers::KillCounter;
    use crate::resolver::{CombatRules, Engagement, ScriptedDice};

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed: Some(seed),
            move_tick_ms: 1,
            report_tick_ms: 5,
            kill_log: None,
            ..SimulationConfig::default()
        }
    }

    /// Config in which nothing moves.
    fn frozen(seed: u64) -> SimulationConfig {
        let mut config = config(seed);
        for profile in [
            &mut config.profiles.ork,
            &mut config.profiles.squirrel,
            &mut config.profiles.druid,
        ] {
            profile.step = 0;
        }
        config
    }

    fn arena_of(entities: &[(EntityKind, &str, i32, i32)]) -> (Arena, Vec<EntityRef>) {
        let refs: Vec<EntityRef> = entities
            .iter()
            .map(|&(kind, name, x, y)| Entity::new(kind, name, x, y).into_ref())
            .collect();
        (refs.iter().cloned().collect(), refs)
    }

    mod creation_tests {
        use super::*;

        #[test]
        fn rejects_invalid_config() {
            let config = SimulationConfig {
                move_tick_ms: 10,
                report_tick_ms: 5,
                ..SimulationConfig::default()
            };
            assert!(matches!(
                Simulation::new(Arena::new(), config),
                Err(ConfigError::Invalid(_))
            ));
        }

        #[test]
        fn accessors() {
            let sim = Simulation::new(Arena::new(), config(3)).unwrap();
            assert!(sim.arena().is_empty());
            assert_eq!(sim.config().seed, Some(3));
            assert!(sim.combat().rules().can_attack(EntityKind::Ork, EntityKind::Druid));
        }
    }

    mod mover_tests {
        use super::*;

        #[test]
        fn moves_stay_on_map() {
            let (arena, refs) = arena_of(&[
                (EntityKind::Ork, "o", 0, 0),
                (EntityKind::Squirrel, "s", 100, 100),
                (EntityKind::Druid, "d", 50, 50),
            ]);
            let sim = Simulation::new(arena, config(1)).unwrap();
            let mut mover = sim.mover();
            for _ in 0..500 {
                mover.move_all();
                for entity in &refs {
                    assert!((0..=100).contains(&entity.x()));
                    assert!((0..=100).contains(&entity.y()));
                }
            }
        }

        #[test]
        fn dead_entities_do_not_move() {
            let (arena, refs) = arena_of(&[(EntityKind::Ork, "o", 40, 40)]);
            refs[0].die();
            let sim = Simulation::new(arena, config(1)).unwrap();
            let mut mover = sim.mover();
            for _ in 0..20 {
                mover.move_all();
            }
            assert_eq!((refs[0].x(), refs[0].y()), (40, 40));
        }

        #[test]
        fn step_respects_kind_profile() {
            let mut config = config(8);
            config.profiles.squirrel = KindProfile::new(1, 5);
            let (arena, refs) = arena_of(&[(EntityKind::Squirrel, "s", 50, 50)]);
            let sim = Simulation::new(arena, config).unwrap();
            let mut mover = sim.mover();
            let mut last = refs[0].position();
            for _ in 0..100 {
                mover.move_all();
                let now = refs[0].position();
                assert!((now - last).abs().max_element() <= 1);
                last = now;
            }
        }

        #[test]
        fn discover_uses_attacker_reach_and_rules() {
            // Ork reach 10, Druid reach 10, Squirrel reach 5.
            let (arena, refs) = arena_of(&[
                (EntityKind::Ork, "o", 0, 0),
                (EntityKind::Druid, "d", 6, 8),
                (EntityKind::Squirrel, "s", 6, 12),
                (EntityKind::Ork, "far", 90, 90),
            ]);
            let sim = Simulation::new(arena, frozen(1)).unwrap();
            let events = sim.mover().discover();

            let pairs: Vec<(&str, &str)> = events
                .iter()
                .map(|e| (e.attacker.name(), e.defender.name()))
                .collect();
            assert_eq!(pairs, vec![("o", "d"), ("d", "s")]);
            assert!(refs.iter().all(|e| e.is_alive()));
        }

        #[test]
        fn discover_skips_the_dead() {
            let (arena, refs) = arena_of(&[
                (EntityKind::Ork, "o", 0, 0),
                (EntityKind::Druid, "d", 1, 1),
            ]);
            refs[1].die();
            let sim = Simulation::new(arena, frozen(1)).unwrap();
            assert!(sim.mover().discover().is_empty());
        }

        #[test]
        fn step_counts_ticks_and_queues() {
            let (arena, _) = arena_of(&[
                (EntityKind::Ork, "o", 0, 0),
                (EntityKind::Druid, "d", 1, 1),
            ]);
            let sim = Simulation::new(arena, frozen(1)).unwrap();
            let mut mover = sim.mover();
            let channel = FightChannel::new();

            assert_eq!(mover.step(&channel), 1);
            assert_eq!(mover.step(&channel), 1);
            assert_eq!(mover.ticks(), 2);
            assert_eq!(channel.len(), 2);

            channel.request_stop();
            assert_eq!(mover.step(&channel), 0);
        }

        #[test]
        fn added_rule_reaches_the_scheduler() {
            let (arena, refs) = arena_of(&[
                (EntityKind::Squirrel, "s", 0, 0),
                (EntityKind::Ork, "o", 3, 4),
            ]);
            let standard = Simulation::new(arena.clone(), frozen(1)).unwrap();
            assert!(standard.mover().discover().is_empty());

            let rules = CombatRules::standard().with_rule(
                EntityKind::Squirrel,
                EntityKind::Ork,
                Engagement::DiceContest,
            );
            let sim = Simulation::new(arena, frozen(1))
                .unwrap()
                .with_combat(CombatResolver::with_rules(rules));
            let events = sim.mover().discover();
            let pairs: Vec<(&str, &str)> = events
                .iter()
                .map(|e| (e.attacker.name(), e.defender.name()))
                .collect();
            assert_eq!(pairs, vec![("s", "o")]);

            let mut resolver = sim.fight_resolver_with(ScriptedDice::attacker_always_wins());
            assert_eq!(resolver.handle(&events[0]), Resolution::AttackerWon);
            assert_eq!(
                resolver.stats(),
                ResolverStats {
                    resolved: 1,
                    kills: 1,
                    stale: 0
                }
            );
            assert!(!refs[1].is_alive());
        }
    }

    mod resolver_tests {
        use super::*;

        #[test]
        fn winning_attacker_kills_defender() {
            let counter = Arc::new(KillCounter::new());
            let (arena, refs) = arena_of(&[
                (EntityKind::Ork, "o", 0, 0),
                (EntityKind::Druid, "d", 1, 1),
            ]);
            refs[0].subscribe(counter.clone());
            let sim = Simulation::new(arena, frozen(1)).unwrap();
            let mut resolver = sim.fight_resolver_with(ScriptedDice::attacker_always_wins());

            let event = FightEvent::new(refs[0].clone(), refs[1].clone());
            assert_eq!(resolver.handle(&event), Resolution::AttackerWon);
            assert!(!refs[1].is_alive());
            assert_eq!(counter.wins(), 1);

            assert_eq!(resolver.handle(&event), Resolution::Stale);
            assert_eq!(counter.calls(), 1);
            assert_eq!(
                resolver.stats(),
                ResolverStats {
                    resolved: 1,
                    kills: 1,
                    stale: 1
                }
            );
        }

        #[test]
        fn holding_defender_survives() {
            let (arena, refs) = arena_of(&[
                (EntityKind::Druid, "d", 0, 0),
                (EntityKind::Squirrel, "s", 1, 1),
            ]);
            let sim = Simulation::new(arena, frozen(1)).unwrap();
            let mut resolver = sim.fight_resolver_with(ScriptedDice::defender_always_holds());

            let event = FightEvent::new(refs[0].clone(), refs[1].clone());
            assert_eq!(resolver.handle(&event), Resolution::DefenderHeld);
            assert!(refs[1].is_alive());
        }

        #[test]
        fn ineligible_pair_is_stale() {
            let (arena, refs) = arena_of(&[
                (EntityKind::Squirrel, "s", 0, 0),
                (EntityKind::Ork, "o", 0, 0),
            ]);
            let sim = Simulation::new(arena, frozen(1)).unwrap();
            let mut dice = ScriptedDice::attacker_always_wins();
            let mut resolver = sim.fight_resolver_with(&mut dice);

            let event = FightEvent::new(refs[0].clone(), refs[1].clone());
            assert_eq!(resolver.handle(&event), Resolution::Stale);
            drop(resolver);
            assert_eq!(dice.draws(), 0);
        }

        #[test]
        fn dead_attacker_is_stale() {
            let (arena, refs) = arena_of(&[
                (EntityKind::Ork, "o", 0, 0),
                (EntityKind::Druid, "d", 0, 0),
            ]);
            refs[0].die();
            let sim = Simulation::new(arena, frozen(1)).unwrap();
            let mut resolver = sim.fight_resolver_with(ScriptedDice::attacker_always_wins());
            let event = FightEvent::new(refs[0].clone(), refs[1].clone());
            assert_eq!(resolver.handle(&event), Resolution::Stale);
            assert!(refs[1].is_alive());
        }

        #[test]
        fn synchronous_step_and_drain() {
            let (arena, refs) = arena_of(&[
                (EntityKind::Ork, "o1", 0, 0),
                (EntityKind::Ork, "o2", 1, 0),
                (EntityKind::Druid, "d", 0, 1),
            ]);
            let sim = Simulation::new(arena, frozen(1)).unwrap();
            let mut mover = sim.mover();
            let mut resolver = sim.fight_resolver_with(ScriptedDice::attacker_always_wins());
            let channel = FightChannel::new();

            assert_eq!(mover.step(&channel), 2);
            assert_eq!(resolver.drain(&channel), 2);
            assert_eq!(
                resolver.stats(),
                ResolverStats {
                    resolved: 1,
                    kills: 1,
                    stale: 1
                }
            );
            assert!(!refs[2].is_alive());
            assert_eq!(mover.step(&channel), 0);
        }
    }

    mod running_tests {
        use super::*;

        #[test]
        fn stop_drains_and_balances() {
            let (arena, refs) = arena_of(&[
                (EntityKind::Ork, "o", 50, 50),
                (EntityKind::Druid, "d", 50, 50),
                (EntityKind::Squirrel, "s", 50, 50),
            ]);
            let sim = Simulation::new(arena, frozen(4)).unwrap();
            let resolver = sim.fight_resolver_with(ScriptedDice::attacker_always_wins());
            let running = sim.start_with(|_: &WorldView| {}, resolver).unwrap();

            while running.ticks() < 3 {
                thread::sleep(Duration::from_millis(1));
            }
            let summary = running.stop();

            assert!(summary.ticks >= 3);
            assert_eq!(
                summary.events_queued,
                summary.fights_resolved + summary.stale
            );
            // First tick queues Ork->Druid then Druid->Squirrel. The Ork wins,
            // so the second event is stale and nothing fights afterwards.
            assert!(refs[0].is_alive());
            assert!(!refs[1].is_alive());
            assert!(refs[2].is_alive());
            assert_eq!(summary.kills, 1);
            assert_eq!(summary.final_view.living().count(), 2);
        }

        #[test]
        fn reporter_receives_views() {
            let (arena, _) = arena_of(&[(EntityKind::Ork, "o", 10, 10)]);
            let sim = Simulation::new(arena, config(2)).unwrap();
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = {
                let seen = Arc::clone(&seen);
                move |view: &WorldView| {
                    seen.lock().unwrap().push(view.entities().len());
                }
            };

            let summary = sim.run_for(Duration::from_millis(30), sink).unwrap();

            let seen = seen.lock().unwrap();
            assert!(!seen.is_empty());
            assert_eq!(seen.len(), summary.reports);
            assert!(seen.iter().all(|&count| count == 1));
        }

        #[test]
        fn dropping_the_handle_stops_threads() {
            let (arena, _) = arena_of(&[(EntityKind::Ork, "o", 10, 10)]);
            let sim = Simulation::new(arena, config(2)).unwrap();
            let running = sim.start(|_: &WorldView| {}).unwrap();
            drop(running);
            // The roster is only shared with the simulation again.
            assert_eq!(Arc::strong_count(sim.arena()), 1);
        }

        #[test]
        fn handle_reports_progress_while_running() {
            let (arena, _) = arena_of(&[
                (EntityKind::Squirrel, "s", 10, 10),
                (EntityKind::Ork, "o", 11, 10),
            ]);
            let sim = Simulation::new(arena, frozen(6)).unwrap();
            let running = sim.start(|_: &WorldView| {}).unwrap();

            thread::sleep(Duration::from_millis(10));
            assert!(running.elapsed() >= Duration::from_millis(10));
            assert_eq!(running.backlog(), 0);

            let summary = running.stop();
            assert!(summary.elapsed >= Duration::from_millis(10));
            assert_eq!(summary.events_queued, 0);
        }

        #[test]
        fn empty_arena_runs_cleanly() {
            let sim = Simulation::new(Arena::new(), config(5)).unwrap();
            let summary = sim.run_for(Duration::from_millis(10), |_: &WorldView| {}).unwrap();
            assert_eq!(summary.events_queued, 0);
            assert_eq!(summary.kills, 0);
            assert!(summary.final_view.entities().is_empty());
        }
    }
}
