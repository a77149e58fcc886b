//! # Frame Benchmark
//!
//! Full `tick()` cost with a steady population, and the finalizer's
//! checksum reduction on its own.
//!
//! Run with: `cargo bench --package brood_sim`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::hint::black_box;

use brood_core::Position;
use brood_sim::{ordered_hash, unordered_checksum, Scenario, Scheduler, SimConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const SCENARIO: &str = r#"
    [[templates]]
    name = "subject"
    countdown = 90
    population = true

    [[entities]]
    position = [0.0, 0.0, 0.0]
    spawn = { template = "subject", count = 1000 }
    count = 20
"#;

fn scheduler(workers: usize) -> Scheduler {
    let config = SimConfig {
        seed: 7,
        workers,
        ..SimConfig::default()
    };
    let world = Scenario::from_toml_str(SCENARIO)
        .and_then(|scenario| scenario.build_world(config.capacity))
        .expect("benchmark scenario loads");
    let mut scheduler = Scheduler::new(config, world).expect("benchmark scheduler starts");
    // Warm up to a steady population
    for _ in 0..10 {
        scheduler.tick().expect("warm-up frame");
    }
    scheduler
}

/// Benchmark: one frame, 20k spawns per frame, by worker count.
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_20k_spawns");
    group.sample_size(20);

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, &workers| {
                let mut scheduler = scheduler(workers);
                b.iter(|| black_box(scheduler.tick().expect("frame")));
            },
        );
    }

    group.finish();
}

/// Benchmark: ordered fold vs parallel unordered sum.
fn bench_checksums(c: &mut Criterion) {
    let positions: Vec<Position> = (0..1_000_000)
        .map(|i| Position::on_plane(i as f32 * 0.5, -(i as f32)))
        .collect();

    c.bench_function("ordered_hash_1M", |b| {
        b.iter(|| ordered_hash(black_box(&positions)));
    });
    c.bench_function("unordered_checksum_1M", |b| {
        b.iter(|| unordered_checksum(black_box(&positions)));
    });
}

criterion_group!(benches, bench_tick, bench_checksums);

criterion_main!(benches);
