//! # BROOD Sim
//!
//! The deterministic frame scheduler. Each frame:
//! - the iteration controller advances,
//! - the population is culled and spawners instantiate new entities,
//! - countdowns expire,
//! - and on the last frame of an iteration the world is checksummed and the
//!   population purged.
//!
//! Same seed, same scenario: same checksums at every iteration boundary,
//! whatever the worker count.
//!
//! ## Example
//!
//! ```rust,ignore
//! use brood_sim::{Scenario, Scheduler, SimConfig};
//!
//! let config = SimConfig::load("data/config/brood.toml")?;
//! let world = Scenario::load("data/scenarios/instantiation.toml")?.build_world(config.capacity)?;
//!
//! let mut scheduler = Scheduler::new(config, world)?;
//! for checksum in scheduler.run_iterations(3)? {
//!     println!("{}: {:08x}", checksum.iteration, checksum.ordered_hash);
//! }
//! ```

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod authoring;
pub mod config;
pub mod error;
pub mod expiration;
pub mod feed;
pub mod finalizer;
pub mod iteration;
pub mod population;
pub mod scheduler;
pub mod timestep;

pub use authoring::Scenario;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use expiration::ExpirationPipeline;
pub use feed::{checksum_channel, ChecksumFeed, ChecksumSink, IterationChecksum};
pub use finalizer::{ordered_hash, unordered_checksum, IterationFinalizer};
pub use iteration::{FrameStep, IterationController};
pub use population::{PopulationPipeline, PopulationReport, SpawnGroup, SpawnPlan};
pub use scheduler::{FrameReport, Scheduler};
pub use timestep::{FixedTimestep, TICK_DURATION, TIMESTEP_HZ};
