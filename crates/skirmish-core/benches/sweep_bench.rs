use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::config::{MapConfig, SimulationConfig};
use skirmish_core::factory;
use skirmish_core::resolver::{CombatResolver, Dice, FightChannel};
use skirmish_core::simulation::Simulation;

fn bench_sweep(c: &mut Criterion) {
    let map = MapConfig::default();
    let combat = CombatResolver::new();

    c.bench_function("sweep_200", |b| {
        b.iter_batched(
            // Fresh arena each time: a sweep kills, so it cannot be reused
            || factory::populate(&mut ChaCha8Rng::seed_from_u64(1), &map, &[], 200),
            |arena| {
                let mut dice = Dice::seeded(2);
                black_box(combat.sweep(&arena, 10, &mut dice))
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_discover(c: &mut Criterion) {
    let config = SimulationConfig {
        seed: Some(3),
        ..SimulationConfig::default()
    };
    let arena = factory::populate(&mut ChaCha8Rng::seed_from_u64(3), &config.map, &[], 500);
    let sim = Simulation::new(arena, config).expect("default config is valid");
    let mover = sim.mover();

    c.bench_function("discover_500", |b| b.iter(|| black_box(mover.discover())));
}

fn bench_mover_step(c: &mut Criterion) {
    let config = SimulationConfig {
        seed: Some(4),
        ..SimulationConfig::default()
    };
    let arena = factory::populate(&mut ChaCha8Rng::seed_from_u64(4), &config.map, &[], 200);
    let sim = Simulation::new(arena, config).expect("default config is valid");
    let mut mover = sim.mover();
    let channel = FightChannel::new();

    c.bench_function("mover_step_200", |b| {
        b.iter(|| {
            let queued = mover.step(&channel);
            // Nothing consumes the queue here
            while channel.try_pop().is_some() {}
            black_box(queued)
        })
    });
}

criterion_group!(benches, bench_sweep, bench_discover, bench_mover_step);
criterion_main!(benches);
