//! # Entity Templates
//!
//! A template is a registered component bundle. Spawners reference
//! templates by [`TemplateId`]; instantiation stamps the bundle onto fresh
//! entities.

use super::component::{Countdown, Position, SpawnRequest, TemplateId};
use crate::error::{EcsError, EcsResult};

/// Components stamped onto every instance of a template.
///
/// Instances always carry a [`Position`]; everything else is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Blueprint {
    /// Initial position (normally overwritten by spawn placement).
    pub position: Position,
    /// Lifetime of each instance, if it expires.
    pub countdown: Option<Countdown>,
    /// Whether instances join the culling population.
    pub population: bool,
    /// Instances that are spawners themselves.
    pub spawn: Option<SpawnRequest>,
}

impl Blueprint {
    /// Creates a blueprint that only carries a position.
    #[must_use]
    pub const fn new(position: Position) -> Self {
        Self {
            position,
            countdown: None,
            population: false,
            spawn: None,
        }
    }

    /// Instances expire after `frames`.
    #[must_use]
    pub const fn with_countdown(mut self, frames: u32) -> Self {
        self.countdown = Some(Countdown::new(frames));
        self
    }

    /// Instances carry the population tag.
    #[must_use]
    pub const fn with_population(mut self) -> Self {
        self.population = true;
        self
    }

    /// Instances spawn `count_per_frame` copies of `template` every frame.
    #[must_use]
    pub const fn with_spawn(mut self, template: TemplateId, count_per_frame: u32) -> Self {
        self.spawn = Some(SpawnRequest::new(template, count_per_frame));
        self
    }
}

/// Append-only registry of blueprints. Ids are dense registration indices.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    blueprints: Vec<Blueprint>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            blueprints: Vec::new(),
        }
    }

    /// Registers a blueprint and returns its id.
    pub fn register(&mut self, blueprint: Blueprint) -> TemplateId {
        let id = TemplateId(self.blueprints.len() as u32);
        self.blueprints.push(blueprint);
        id
    }

    /// Looks up a blueprint.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownTemplate`] for ids that were never registered.
    pub fn get(&self, id: TemplateId) -> EcsResult<&Blueprint> {
        self.blueprints
            .get(id.0 as usize)
            .ok_or(EcsError::UnknownTemplate(id))
    }

    /// Returns true if `id` was registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: TemplateId) -> bool {
        (id.0 as usize) < self.blueprints.len()
    }

    /// Number of registered templates.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Returns true if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TemplateRegistry::new();
        let a = registry.register(Blueprint::default().with_population());
        let b = registry.register(Blueprint::default().with_countdown(5));

        assert_eq!(a, TemplateId(0));
        assert_eq!(b, TemplateId(1));
        assert!(registry.get(a).unwrap().population);
        assert_eq!(registry.get(b).unwrap().countdown, Some(Countdown::new(5)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_template() {
        let registry = TemplateRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains(TemplateId(0)));
        assert_eq!(
            registry.get(TemplateId(3)).unwrap_err(),
            EcsError::UnknownTemplate(TemplateId(3))
        );
    }
}
