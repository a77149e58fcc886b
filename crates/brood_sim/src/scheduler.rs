//! # BROOD Frame Scheduler
//!
//! One `tick()` runs one frame, always in this order:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. ADVANCE ITERATION                                                │
//! │    └─ Controller writes remaining frames / final flag               │
//! │                                                                     │
//! │ 2. POPULATION UPDATE                                                │
//! │    ├─ Plan culls ‖ plan spawns (read-only, joined)                  │
//! │    ├─ Destroy doomed                                                │
//! │    ├─ Instantiate groups                                            │
//! │    └─ Write positions (parallel, disjoint slots)                    │
//! │                                                                     │
//! │ 3. EXPIRATION                                                       │
//! │    ├─ Decrement countdowns (parallel, disjoint slots)               │
//! │    └─ Destroy expired                                               │
//! │                                                                     │
//! │ 4. FINALIZE (final frame only)                                      │
//! │    ├─ Ordered hash ‖ unordered checksum                             │
//! │    ├─ Log + publish                                                 │
//! │    └─ Purge population                                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All parallel work runs on the scheduler's own worker pool.

use std::time::{Duration, Instant};

use brood_core::World;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::expiration::ExpirationPipeline;
use crate::feed::{ChecksumSink, IterationChecksum};
use crate::finalizer::IterationFinalizer;
use crate::iteration::{FrameStep, IterationController};
use crate::population::{PopulationPipeline, PopulationReport};
use crate::timestep::TICK_DURATION;

/// What happened in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, from zero.
    pub frame: u64,
    /// Iteration state for this frame.
    pub step: FrameStep,
    /// Cull / spawn counts.
    pub population: PopulationReport,
    /// Entities whose countdown ran out.
    pub expired: usize,
    /// Checksum, on final frames.
    pub checksum: Option<IterationChecksum>,
    /// Population members purged, on final frames.
    pub purged: usize,
    /// Wall time spent in the frame.
    pub elapsed_us: u64,
}

/// The frame orchestrator.
///
/// Owns the world, the worker pool and every pipeline.
pub struct Scheduler {
    /// The entity store.
    world: World,
    /// Worker pool all parallel passes run on.
    pool: rayon::ThreadPool,
    /// Iteration state.
    controller: IterationController,
    /// Cull + spawn.
    population: PopulationPipeline,
    /// Countdown retirement.
    expiration: ExpirationPipeline,
    /// Checksum + purge.
    finalizer: IterationFinalizer,
    /// Configuration.
    config: SimConfig,
    /// Frame counter.
    frame_count: u64,
    /// Accumulated frame statistics.
    stats: FrameStatsAccumulator,
    /// Set once a frame fails.
    poisoned: bool,
}

impl Scheduler {
    /// Creates a scheduler around an authored world.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] if the configuration does not validate or
    /// the world was built with a different capacity,
    /// [`SimError::WorkerPool`] if the pool cannot start.
    pub fn new(config: SimConfig, world: World) -> SimResult<Self> {
        config.validate()?;
        if world.capacity() != config.capacity {
            return Err(SimError::InvalidConfig(format!(
                "world capacity {} does not match configured capacity {}",
                world.capacity(),
                config.capacity
            )));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("brood-worker-{i}"))
            .build()?;

        tracing::debug!(
            workers = config.workers,
            seed = config.seed,
            frames_per_iteration = config.frames_per_iteration,
            entities = world.alive_count(),
            "scheduler ready"
        );

        Ok(Self {
            controller: IterationController::new(
                config.frames_per_iteration,
                config.initial_countdown(),
            ),
            population: PopulationPipeline::new(&config),
            expiration: ExpirationPipeline::new(),
            finalizer: IterationFinalizer::new(),
            world,
            pool,
            config,
            frame_count: 0,
            stats: FrameStatsAccumulator::new(),
            poisoned: false,
        })
    }

    /// Publishes every finalized checksum to `sink` as well as the log.
    #[must_use]
    pub fn with_sink(mut self, sink: ChecksumSink) -> Self {
        self.finalizer.set_sink(sink);
        self
    }

    /// Runs one frame.
    ///
    /// # Errors
    ///
    /// Any pipeline error. The scheduler is then poisoned and every later
    /// call returns [`SimError::Poisoned`].
    pub fn tick(&mut self) -> SimResult<FrameReport> {
        if self.poisoned {
            return Err(SimError::Poisoned);
        }

        let start = Instant::now();
        let frame = self.frame_count;
        let Self {
            world,
            pool,
            controller,
            population,
            expiration,
            finalizer,
            ..
        } = self;

        let result = pool.install(|| -> SimResult<FrameReport> {
            let step = controller.advance();
            let counts = population.run(world, step.remaining_frames)?;
            let expired = expiration.run(world)?;

            let (checksum, purged) = if step.final_frame {
                let (record, purged) = finalizer.finalize(world, step.iteration)?;
                (Some(record), purged)
            } else {
                (None, 0)
            };

            Ok(FrameReport {
                frame,
                step,
                population: counts,
                expired,
                checksum,
                purged,
                elapsed_us: 0,
            })
        });

        match result {
            Ok(mut report) => {
                report.elapsed_us = start.elapsed().as_micros() as u64;
                self.frame_count += 1;
                self.stats.record(report.elapsed_us);
                tracing::trace!(
                    frame = report.frame,
                    remaining = report.step.remaining_frames,
                    alive = self.world.alive_count(),
                    "frame complete"
                );
                Ok(report)
            }
            Err(err) => {
                self.poisoned = true;
                tracing::error!(frame, error = %err, "frame failed, scheduler poisoned");
                Err(err)
            }
        }
    }

    /// Ticks until `iterations` more iterations have finalized.
    ///
    /// # Returns
    ///
    /// The checksum of every iteration finalized on the way.
    ///
    /// # Errors
    ///
    /// The first failing frame's error.
    pub fn run_iterations(&mut self, iterations: u64) -> SimResult<Vec<IterationChecksum>> {
        let mut checksums = Vec::new();
        while (checksums.len() as u64) < iterations {
            if let Some(record) = self.tick()?.checksum {
                checksums.push(record);
            }
        }
        Ok(checksums)
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Iterations finalized so far.
    #[inline]
    #[must_use]
    pub const fn completed_iterations(&self) -> u64 {
        self.controller.completed_iterations()
    }

    /// The entity store.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns true once a frame has failed.
    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of frame times.
    pub total_us_sum: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that took longer than one timestep.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            max_frame_us: 0,
            frames_over_budget: 0,
        }
    }

    /// Records one frame's duration.
    pub fn record(&mut self, frame_us: u64) {
        self.frames_recorded += 1;
        self.total_us_sum += frame_us;
        self.max_frame_us = self.max_frame_us.max(frame_us);

        if Duration::from_micros(frame_us) > TICK_DURATION {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
