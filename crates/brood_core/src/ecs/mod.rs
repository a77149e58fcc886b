//! # Entity Component System
//!
//! The explicit, passed-by-reference entity store.
//!
//! ## Design Philosophy
//!
//! - All slots and component columns are pre-allocated at world creation
//! - Components are stored in dense arrays indexed by slot
//! - Entity IDs are slot indices with generation counters
//! - Tags are mask bits with no storage
//! - Templates are registered blueprints, instantiated in contiguous runs

mod component;
mod entity;
mod storage;
mod template;
mod world;

pub use component::{
    Component, ComponentSet, Countdown, PopulationTag, Position, SpawnRequest, Tag, TemplateId,
};
pub use entity::{Entity, EntityId};
pub use storage::ComponentStorage;
pub use template::{Blueprint, TemplateRegistry};
pub use world::{Column, World};
