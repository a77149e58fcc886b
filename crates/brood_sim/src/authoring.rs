//! # Scenario Authoring
//!
//! Scenarios are plain TOML records turned into a [`World`] once, before the
//! first tick:
//!
//! ```toml
//! [[templates]]
//! name = "subject"
//! countdown = 90
//! population = true
//!
//! [[entities]]
//! position = [0.0, 0.0, 0.0]
//! spawn = { template = "subject", count = 25 }
//! ```
//!
//! Template names are resolved up front. Templates may reference each other
//! in any order; an unknown or duplicate name fails the whole load.

use std::collections::HashMap;
use std::path::Path;

use brood_core::{Blueprint, Position, TemplateId, World};
use serde::Deserialize;

use crate::config::check_capacity;
use crate::error::{SimError, SimResult};

/// A complete scenario file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Named blueprints, registered in file order.
    #[serde(default)]
    pub templates: Vec<TemplateRecord>,
    /// Initial entities, created in file order.
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

/// A named blueprint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateRecord {
    /// Name other records use to reference this template.
    pub name: String,
    /// Initial position of instances.
    #[serde(default)]
    pub position: [f32; 3],
    /// Lifetime of instances in frames.
    pub countdown: Option<u32>,
    /// Whether instances join the culling population.
    #[serde(default)]
    pub population: bool,
    /// Instances spawn this every frame.
    pub spawn: Option<SpawnRecord>,
}

/// An authored entity, optionally replicated.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityRecord {
    /// World position.
    #[serde(default)]
    pub position: [f32; 3],
    /// Lifetime in frames.
    pub countdown: Option<u32>,
    /// Whether the entity joins the culling population.
    #[serde(default)]
    pub population: bool,
    /// Per-frame spawn request.
    pub spawn: Option<SpawnRecord>,
    /// Copies of this record to create.
    #[serde(default = "one")]
    pub count: u32,
}

/// A spawn request by template name.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpawnRecord {
    /// Template name.
    pub template: String,
    /// Instances per frame.
    pub count: u32,
}

const fn one() -> u32 {
    1
}

impl Scenario {
    /// Parses a scenario from TOML text.
    ///
    /// # Errors
    ///
    /// [`SimError::Toml`] on malformed input or unknown keys.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a scenario file.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] if the file cannot be read, otherwise as
    /// [`Scenario::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Maps every template name to the id it will be registered under.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] on duplicate names.
    pub fn template_ids(&self) -> SimResult<HashMap<&str, TemplateId>> {
        let mut ids = HashMap::with_capacity(self.templates.len());
        for (index, record) in self.templates.iter().enumerate() {
            if ids
                .insert(record.name.as_str(), TemplateId(index as u32))
                .is_some()
            {
                return Err(SimError::InvalidConfig(format!(
                    "duplicate template name {:?}",
                    record.name
                )));
            }
        }
        Ok(ids)
    }

    /// Builds a world of `capacity` slots holding the scenario.
    ///
    /// Every name is checked before the world is touched.
    ///
    /// # Errors
    ///
    /// Configuration errors for bad names or an unusable `capacity`, store
    /// errors if the scenario does not fit `capacity`.
    pub fn build_world(&self, capacity: usize) -> SimResult<World> {
        check_capacity(capacity)?;
        let ids = self.template_ids()?;
        let resolve = |spawn: &Option<SpawnRecord>| -> SimResult<Option<(TemplateId, u32)>> {
            spawn
                .as_ref()
                .map(|s| {
                    ids.get(s.template.as_str())
                        .map(|&id| (id, s.count))
                        .ok_or_else(|| SimError::UnknownTemplateName(s.template.clone()))
                })
                .transpose()
        };

        let mut blueprints = Vec::with_capacity(self.templates.len());
        for record in &self.templates {
            let mut blueprint = Blueprint::new(to_position(record.position));
            if let Some(frames) = record.countdown {
                blueprint = blueprint.with_countdown(frames);
            }
            if record.population {
                blueprint = blueprint.with_population();
            }
            if let Some((template, count)) = resolve(&record.spawn)? {
                blueprint = blueprint.with_spawn(template, count);
            }
            blueprints.push(blueprint);
        }

        let mut spawns = Vec::with_capacity(self.entities.len());
        for record in &self.entities {
            spawns.push(resolve(&record.spawn)?);
        }

        let mut world = World::new(capacity);
        for blueprint in blueprints {
            world.register_template(blueprint);
        }

        for (record, spawn) in self.entities.iter().zip(spawns) {
            for _ in 0..record.count {
                let id = world.spawn()?;
                world.insert(id, to_position(record.position))?;
                if let Some(frames) = record.countdown {
                    world.attach_countdown(id, frames)?;
                }
                if let Some((template, count)) = spawn {
                    world.attach_spawn_request(id, template, count)?;
                }
                if record.population {
                    world.attach_population_tag(id)?;
                }
            }
        }

        tracing::debug!(
            templates = world.templates().len(),
            entities = world.alive_count(),
            "scenario loaded"
        );
        Ok(world)
    }
}

const fn to_position([x, y, z]: [f32; 3]) -> Position {
    Position::new(x, y, z)
}
