//! Skirmish command line runner.
//!
//! Populates (or loads) an arena, then either runs the realtime scheduler
//! for a while or settles everything with one batch sweep, and prints who is
//! left standing.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::arena::Arena;
use skirmish_core::config::SimulationConfig;
use skirmish_core::factory;
use skirmish_core::observers::{ConsoleObserver, FightObserver, FileObserver, TracingObserver};
use skirmish_core::report::{self, ConsoleReporter, MapRenderer};
use skirmish_core::resolver::{task_seed, CombatResolver, Dice};
use skirmish_core::simulation::Simulation;
use skirmish_core::storage;
use tracing::{info, warn};

/// Dice stream used by the batch sweep.
const SWEEP_STREAM: u64 = 2;

/// Skirmish - Orks, Squirrels and Druids fighting it out on a small map
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Run a concurrent combat arena and print the survivors")]
struct Args {
    /// JSON configuration file; defaults apply when omitted
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Master seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Run length in seconds (overrides the configuration)
    #[arg(long)]
    duration: Option<u64>,

    /// Number of random entities to create (overrides the configuration)
    #[arg(long)]
    entities: Option<usize>,

    /// Load the arena from a record file instead of populating it
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the final arena to a record file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resolve everything with one batch sweep at this distance instead of
    /// running the realtime scheduler
    #[arg(long, value_name = "DISTANCE")]
    sweep: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let observers = build_observers(&config)?;

    let mut arena = match &args.load {
        Some(path) => load_arena(path, &observers),
        None => {
            let mut rng = match config.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            factory::populate(&mut rng, &config.map, &observers, config.initial_entities)
        }
    };
    info!(entities = arena.len(), "arena ready");

    let stdout = io::stdout();
    {
        let _console = report::console_lock();
        report::print_all(&arena, &mut stdout.lock())?;
    }

    if let Some(distance) = args.sweep {
        let mut dice = match config.seed {
            Some(seed) => Dice::seeded(task_seed(seed, SWEEP_STREAM)),
            None => Dice::from_entropy(),
        };
        let dead = CombatResolver::new().sweep(&arena, distance, &mut dice);
        let removed = arena.remove_all(&dead);
        info!(distance, killed = removed, "sweep finished");
    } else {
        arena = run_scheduler(arena, config)?;
    }

    {
        let _console = report::console_lock();
        report::print_survivors(&arena, &mut stdout.lock())?;
    }

    if let Some(path) = &args.save {
        storage::save(&arena, path)
            .with_context(|| format!("failed to save arena to {}", path.display()))?;
        info!(path = %path.display(), "arena saved");
    }
    Ok(())
}

/// Loads the configuration file, if any, and applies command line overrides.
fn build_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(secs) = args.duration {
        config.duration_secs = secs;
    }
    if let Some(count) = args.entities {
        config.initial_entities = count;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_observers(config: &SimulationConfig) -> Result<Vec<Arc<dyn FightObserver>>> {
    let mut observers: Vec<Arc<dyn FightObserver>> =
        vec![Arc::new(ConsoleObserver::new()), Arc::new(TracingObserver::new())];
    if let Some(path) = &config.kill_log {
        let sink = FileObserver::create(path)
            .with_context(|| format!("failed to open kill log {}", path.display()))?;
        observers.push(Arc::new(sink));
    }
    Ok(observers)
}

fn load_arena(path: &Path, observers: &[Arc<dyn FightObserver>]) -> Arena {
    let loaded = storage::load(path, observers);
    if let Some(failure) = &loaded.failure {
        warn!(error = %failure, "arena store unusable, starting empty");
    }
    if !loaded.skipped.is_empty() {
        warn!(skipped = loaded.skipped.len(), "some records were skipped");
    }
    loaded.arena
}

/// Runs the three scheduler threads for the configured duration, then hands
/// the arena back with the dead dropped.
fn run_scheduler(arena: Arena, config: SimulationConfig) -> Result<Arena> {
    let duration = config.duration();
    let renderer = MapRenderer::from_config(&config.map);
    let sim = Simulation::new(arena, config).context("invalid configuration")?;

    info!(secs = duration.as_secs(), "scheduler running");
    let running = sim
        .start(ConsoleReporter::new(renderer))
        .context("failed to start the scheduler")?;
    thread::sleep(duration);
    info!(
        elapsed_ms = running.elapsed().as_millis(),
        backlog = running.backlog(),
        "stopping scheduler"
    );
    let summary = running.stop();
    info!(
        ticks = summary.ticks,
        queued = summary.events_queued,
        resolved = summary.fights_resolved,
        kills = summary.kills,
        stale = summary.stale,
        reports = summary.reports,
        "scheduler finished"
    );

    let mut arena: Arena = sim.arena().iter().cloned().collect();
    let dead: Vec<_> = arena.iter().filter(|e| !e.is_alive()).cloned().collect();
    arena.remove_all(&dead);
    Ok(arena)
}
