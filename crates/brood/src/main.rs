//! # BROOD Runner
//!
//! Headless. Runs a scenario for a number of iterations and logs
//! `Ordered hash: <h>, unordered checksum: <s>` at the end of each one.
//!
//! ```bash
//! # As fast as possible
//! brood --scenario data/scenarios/instantiation.toml --iterations 3
//!
//! # Paced at 60 Hz, more logging
//! RUST_LOG=brood_sim=debug brood --config data/config/brood.toml --realtime
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use brood_sim::{FixedTimestep, Scenario, Scheduler, SimConfig, TIMESTEP_HZ};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Deterministic parallel spawn/cull scheduler.
#[derive(Parser, Debug)]
#[command(name = "brood", version, about)]
struct Cli {
    /// Simulation config (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scenario to author the world from (TOML).
    #[arg(long, default_value = "data/scenarios/instantiation.toml")]
    scenario: PathBuf,

    /// Iterations to finalize before exiting.
    #[arg(long, default_value_t = 3)]
    iterations: u64,

    /// Worker threads (overrides the config).
    #[arg(long)]
    workers: Option<usize>,

    /// Seed (overrides the config).
    #[arg(long)]
    seed: Option<u64>,

    /// Pace ticks at the fixed timestep instead of running flat out.
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let world = Scenario::load(&cli.scenario)
        .and_then(|scenario| scenario.build_world(config.capacity))
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;

    tracing::info!(
        seed = config.seed,
        workers = config.workers,
        frames_per_iteration = config.frames_per_iteration,
        entities = world.alive_count(),
        "starting"
    );

    let mut scheduler = Scheduler::new(config, world).context("starting scheduler")?;

    if cli.realtime {
        run_realtime(&mut scheduler, cli.iterations)?;
    } else {
        scheduler
            .run_iterations(cli.iterations)
            .context("simulation failed")?;
    }

    let stats = scheduler.stats();
    tracing::info!(
        frames = scheduler.frame_count(),
        iterations = scheduler.completed_iterations(),
        avg_frame_ms = format!("{:.3}", stats.avg_frame_ms()),
        max_frame_ms = format!("{:.3}", stats.max_frame_us as f64 / 1000.0),
        over_budget = format!("{:.1}%", stats.over_budget_ratio() * 100.0),
        "done"
    );
    Ok(())
}

fn run_realtime(scheduler: &mut Scheduler, iterations: u64) -> Result<()> {
    tracing::info!(hz = TIMESTEP_HZ, "pacing ticks");
    let target = scheduler.completed_iterations() + iterations;
    let mut timestep = FixedTimestep::new();

    while scheduler.completed_iterations() < target {
        if !timestep.should_tick() {
            timestep.wait_for_next_tick();
            continue;
        }
        let start = timestep.begin_tick();
        scheduler.tick().context("simulation failed")?;
        timestep.end_tick(start);
    }

    let late = timestep.late_ticks();
    if late > 0 {
        tracing::warn!(
            late,
            ticks = timestep.tick_count(),
            slowest_ms = format!("{:.3}", timestep.slowest_tick().as_secs_f64() * 1000.0),
            "some ticks ran over budget"
        );
    }
    Ok(())
}
