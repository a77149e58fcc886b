//! # BROOD Core
//!
//! The entity store and deterministic primitives underneath the BROOD
//! simulation scheduler:
//! - Generational entity ids (stale ids are rejected, never dereferenced)
//! - Fixed-capacity component columns and entity templates
//! - Fixed-capacity buffers for plan results
//! - Index-and-seed derived random streams, position hashing
//! - Pass access declarations and fork/join execution
//!
//! ## Architecture Rules
//!
//! 1. **No hidden state** - the store is an explicit value, randomness is a
//!    pure function of `(index, seed)`
//! 2. **Plan reads, apply writes** - parallel passes only ever borrow the
//!    store immutably, or write disjoint slots of one column
//! 3. **Enumeration order is slot order** - every query walks alive slots
//!    in ascending index, which is the canonical order for ordered hashing
//!
//! ## Example
//!
//! ```rust,ignore
//! use brood_core::{Blueprint, Position, World};
//!
//! let mut world = World::new(1024);
//! let subject = world.register_template(Blueprint::new(Position::default()).with_population());
//! let spawner = world.spawn()?;
//! world.insert(spawner, Position::new(10.0, 0.0, 10.0))?;
//! world.attach_spawn_request(spawner, subject, 25)?;
//! ```

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;
pub mod memory;
pub mod random;
pub mod sync;

pub use ecs::{
    Blueprint, Column, Component, ComponentSet, Countdown, Entity, EntityId, PopulationTag,
    Position, SpawnRequest, Tag, TemplateId, TemplateRegistry, World,
};
pub use error::{EcsError, EcsResult};
pub use memory::FixedList;
pub use random::{hash2, hash_position, RandomSource, RandomStream};
pub use sync::{join, run_pair, Access, Pass};
