//! Integration test: checksums are reproducible across runs and worker counts.

use brood_core::{Blueprint, EntityId, Position, World};
use brood_sim::{
    checksum_channel, IterationChecksum, PopulationPipeline, Scenario, Scheduler, SimConfig,
};

const SCENARIO: &str = r#"
    [[templates]]
    name = "subject"
    countdown = 6
    population = true

    [[templates]]
    name = "marker"
    countdown = 2

    [[entities]]
    position = [0.0, 0.0, 0.0]
    spawn = { template = "subject", count = 40 }
    count = 2

    [[entities]]
    position = [250.0, 0.0, -80.0]
    spawn = { template = "marker", count = 5 }

    [[entities]]
    position = [-40.0, 0.0, 40.0]
    spawn = { template = "subject", count = 30 }

    [[entities]]
    population = true
    count = 50
"#;

fn config(seed: u64, workers: usize) -> SimConfig {
    SimConfig {
        seed,
        frames_per_iteration: 10,
        first_iteration_frames: None,
        workers,
        capacity: 16_384,
        ..SimConfig::default()
    }
}

fn run(seed: u64, workers: usize, iterations: u64) -> Vec<IterationChecksum> {
    let config = config(seed, workers);
    let world = Scenario::from_toml_str(SCENARIO)
        .unwrap()
        .build_world(config.capacity)
        .unwrap();
    Scheduler::new(config, world)
        .unwrap()
        .run_iterations(iterations)
        .unwrap()
}

#[test]
fn test_replay_is_identical() {
    assert_eq!(run(7, 4, 3), run(7, 4, 3));
}

#[test]
fn test_worker_count_does_not_matter() {
    let single = run(7, 1, 3);
    for workers in [2, 3, 8] {
        assert_eq!(single, run(7, workers, 3), "workers = {workers}");
    }
}

#[test]
fn test_seed_changes_checksums() {
    let a = run(1, 2, 1);
    let b = run(2, 2, 1);
    assert_ne!(a[0].ordered_hash, b[0].ordered_hash);
}

#[test]
fn test_iterations_are_numbered_in_order() {
    let checksums = run(11, 4, 4);
    assert_eq!(checksums.len(), 4);
    assert!(checksums.iter().all(|c| c.surviving > 0));
    assert_eq!(
        checksums.iter().map(|c| c.iteration).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn test_feed_matches_run() {
    let config = config(3, 2);
    let world = Scenario::from_toml_str(SCENARIO)
        .unwrap()
        .build_world(config.capacity)
        .unwrap();
    let (sink, feed) = checksum_channel(8);
    let mut scheduler = Scheduler::new(config, world).unwrap().with_sink(sink);

    let returned = scheduler.run_iterations(2).unwrap();
    assert_eq!(feed.drain(), returned);
    assert_eq!(feed.dropped(), 0);
}

#[test]
fn test_four_subject_cull_plan_replays() {
    // Four tagged entities on the x axis, seed 7, frame key 0
    fn plan() -> (Vec<EntityId>, Vec<EntityId>) {
        let mut world = World::new(16);
        let subject = world.register_template(Blueprint::default().with_population());
        let mut ids = [EntityId::NULL; 4];
        world.instantiate(subject, &mut ids).unwrap();
        for (i, id) in ids.iter().enumerate() {
            world.insert(*id, Position::on_plane(i as f32, 0.0)).unwrap();
        }

        let pipeline = PopulationPipeline::new(&config(7, 2));
        let doomed = pipeline.plan_culls(&world, 0).unwrap();
        (ids.to_vec(), doomed.as_slice().to_vec())
    }

    let (ids, doomed_a) = plan();
    let (_, doomed_b) = plan();
    assert_eq!(doomed_a, doomed_b);
    assert!(doomed_a.iter().all(|id| ids.contains(id)));
    assert!(doomed_a.windows(2).all(|w| w[0].index() < w[1].index()));
}
