//! # ECS World
//!
//! The central container for all entities, components and templates.
//! Pre-allocates all slots at creation time.

use super::component::{
    Component, ComponentSet, Countdown, PopulationTag, Position, SpawnRequest, Tag, TemplateId,
};
use super::entity::{Entity, EntityId};
use super::storage::ComponentStorage;
use super::template::{Blueprint, TemplateRegistry};
use crate::error::{EcsError, EcsResult};

/// Typed access from a component type to its column in the [`World`].
///
/// Implemented for every stored component; lets the world expose generic
/// `insert` / `component` / `column_mut` instead of one method per type.
pub trait Column: Component {
    /// Shared access to the column.
    fn column(world: &World) -> &ComponentStorage<Self>;
    /// Exclusive access to the column.
    fn column_mut(world: &mut World) -> &mut ComponentStorage<Self>;
    /// Entity slots (read) alongside this column (write).
    fn split_mut(world: &mut World) -> (&[Entity], &mut ComponentStorage<Self>);
}

impl Column for Position {
    fn column(world: &World) -> &ComponentStorage<Self> {
        &world.positions
    }
    fn column_mut(world: &mut World) -> &mut ComponentStorage<Self> {
        &mut world.positions
    }
    fn split_mut(world: &mut World) -> (&[Entity], &mut ComponentStorage<Self>) {
        (&world.entities, &mut world.positions)
    }
}

impl Column for Countdown {
    fn column(world: &World) -> &ComponentStorage<Self> {
        &world.countdowns
    }
    fn column_mut(world: &mut World) -> &mut ComponentStorage<Self> {
        &mut world.countdowns
    }
    fn split_mut(world: &mut World) -> (&[Entity], &mut ComponentStorage<Self>) {
        (&world.entities, &mut world.countdowns)
    }
}

impl Column for SpawnRequest {
    fn column(world: &World) -> &ComponentStorage<Self> {
        &world.spawn_requests
    }
    fn column_mut(world: &mut World) -> &mut ComponentStorage<Self> {
        &mut world.spawn_requests
    }
    fn split_mut(world: &mut World) -> (&[Entity], &mut ComponentStorage<Self>) {
        (&world.entities, &mut world.spawn_requests)
    }
}

/// The entity store.
///
/// All slots are pre-allocated at creation. Spawning past capacity is an
/// error rather than a reallocation. Slots are reused LIFO, and each reuse
/// bumps the slot generation so ids issued before the reuse go stale.
///
/// # Enumeration order
///
/// [`World::query`] and friends walk alive slots in ascending index order.
/// That order is the canonical order for everything that depends on
/// enumeration (query ranks, ordered hashing).
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new(1024);
///
/// let entity = world.spawn()?;
/// world.insert(entity, Position::new(1.0, 0.0, 3.0))?;
/// world.attach_population_tag(entity)?;
/// ```
pub struct World {
    /// All entity slots (pre-allocated).
    entities: Box<[Entity]>,
    /// Free list of entity indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
    /// Maximum capacity.
    capacity: usize,

    // =========================================================================
    // Component Storages - Add new component types here (and a Column impl)
    // =========================================================================
    /// Position component storage.
    positions: ComponentStorage<Position>,
    /// Countdown component storage.
    countdowns: ComponentStorage<Countdown>,
    /// Spawn request component storage.
    spawn_requests: ComponentStorage<SpawnRequest>,

    /// Registered blueprints.
    templates: TemplateRegistry,
}

impl World {
    /// Creates a new world with the specified entity capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            u32::try_from(capacity).is_ok(),
            "Capacity cannot exceed u32::MAX"
        );

        let entities = vec![Entity::dead(); capacity].into_boxed_slice();

        // Reversed so that pops hand out slot 0, 1, 2, ... on a fresh world
        let free_indices: Vec<u32> = (0..capacity as u32).rev().collect();

        Self {
            entities,
            free_indices,
            alive_count: 0,
            capacity,
            positions: ComponentStorage::new(capacity),
            countdowns: ComponentStorage::new(capacity),
            spawn_requests: ComponentStorage::new(capacity),
            templates: TemplateRegistry::new(),
        }
    }

    /// Returns the maximum capacity of this world.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_indices.len()
    }

    /// All entity slots, alive or not, in slot order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawns a new, component-less entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityExhausted`] when no slot is free.
    #[inline]
    pub fn spawn(&mut self) -> EcsResult<EntityId> {
        let Some(index) = self.free_indices.pop() else {
            return Err(EcsError::CapacityExhausted {
                capacity: self.capacity,
            });
        };

        let entity = &mut self.entities[index as usize];

        // Increment generation to invalidate old references
        let generation = entity.id.generation().wrapping_add(1);
        let new_id = EntityId::new(index, generation);

        *entity = Entity::new(new_id);
        self.alive_count += 1;

        Ok(new_id)
    }

    /// Despawns an entity, freeing its slot for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is null, out of range,
    /// already dead, or from an earlier generation of the slot.
    #[inline]
    pub fn despawn(&mut self, id: EntityId) -> EcsResult<()> {
        self.check_alive(id)?;

        let idx = id.slot();
        let entity = &mut self.entities[idx];
        entity.alive = false;
        entity.components = ComponentSet::EMPTY;
        self.alive_count -= 1;

        self.free_indices.push(id.index());

        self.positions.reset(idx);
        self.countdowns.reset(idx);
        self.spawn_requests.reset(idx);

        Ok(())
    }

    /// Despawns every id in `ids`, in order.
    ///
    /// All ids are checked before the first one is destroyed, so a stale id
    /// leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] for the first id that is not alive.
    pub fn despawn_batch(&mut self, ids: &[EntityId]) -> EcsResult<usize> {
        for &id in ids {
            self.check_alive(id)?;
        }
        for &id in ids {
            self.despawn(id)?;
        }
        Ok(ids.len())
    }

    /// Despawns every alive entity matching `set`, in enumeration order.
    ///
    /// # Returns
    ///
    /// Number of entities destroyed.
    ///
    /// # Errors
    ///
    /// As [`World::despawn_batch`]. Nothing is destroyed on error.
    pub fn despawn_matching(&mut self, set: ComponentSet) -> EcsResult<usize> {
        let doomed: Vec<EntityId> = self.query(set).collect();
        self.despawn_batch(&doomed)
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        if id.is_null() {
            return false;
        }
        self.entities
            .get(id.slot())
            .is_some_and(|entity| entity.alive && entity.id == id)
    }

    /// Returns `Ok(())` if `id` is alive.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] otherwise.
    #[inline]
    pub fn check_alive(&self, id: EntityId) -> EcsResult<()> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity(id))
        }
    }

    /// Gets an entity slot by id.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is not alive.
    #[inline]
    pub fn get(&self, id: EntityId) -> EcsResult<&Entity> {
        self.check_alive(id)?;
        Ok(&self.entities[id.slot()])
    }

    // =========================================================================
    // Components & tags
    // =========================================================================

    /// Attaches (or overwrites) a component.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is not alive.
    pub fn insert<C: Column>(&mut self, id: EntityId, component: C) -> EcsResult<()> {
        self.check_alive(id)?;
        let idx = id.slot();
        C::column_mut(self).set(idx, component);
        self.entities[idx].add_component(C::ID);
        Ok(())
    }

    /// Detaches a component, resetting its slot.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is not alive.
    pub fn remove<C: Column>(&mut self, id: EntityId) -> EcsResult<()> {
        self.check_alive(id)?;
        let idx = id.slot();
        C::column_mut(self).reset(idx);
        self.entities[idx].remove_component(C::ID);
        Ok(())
    }

    /// Reads a copy of a component.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`] for dead ids, [`EcsError::MissingComponent`]
    /// if the component is not attached.
    pub fn component<C: Column>(&self, id: EntityId) -> EcsResult<C> {
        let entity = self.get(id)?;
        if !entity.has_component(C::ID) {
            return Err(EcsError::MissingComponent {
                entity: id,
                component: C::NAME,
            });
        }
        Ok(C::column(self).as_slice()[id.slot()])
    }

    /// Mutable access to an attached component.
    ///
    /// # Errors
    ///
    /// Same as [`World::component`].
    pub fn component_mut<C: Column>(&mut self, id: EntityId) -> EcsResult<&mut C> {
        let entity = self.get(id)?;
        if !entity.has_component(C::ID) {
            return Err(EcsError::MissingComponent {
                entity: id,
                component: C::NAME,
            });
        }
        Ok(&mut C::column_mut(self).as_mut_slice()[id.slot()])
    }

    /// Adds a tag.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is not alive.
    pub fn add_tag<T: Tag>(&mut self, id: EntityId) -> EcsResult<()> {
        self.check_alive(id)?;
        self.entities[id.slot()].add_component(T::ID);
        Ok(())
    }

    /// Checks for a tag.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is not alive.
    pub fn has_tag<T: Tag>(&self, id: EntityId) -> EcsResult<bool> {
        Ok(self.get(id)?.has_component(T::ID))
    }

    /// Authoring: the entity expires after `frames`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is not alive.
    pub fn attach_countdown(&mut self, id: EntityId, frames: u32) -> EcsResult<()> {
        self.insert(id, Countdown::new(frames))
    }

    /// Authoring: the entity spawns `count_per_frame` copies of `template`
    /// every frame.
    ///
    /// The template is not resolved here, so scenarios may reference
    /// templates registered later. Unresolved templates are rejected when
    /// spawns are planned.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is not alive.
    pub fn attach_spawn_request(
        &mut self,
        id: EntityId,
        template: TemplateId,
        count_per_frame: u32,
    ) -> EcsResult<()> {
        self.insert(id, SpawnRequest::new(template, count_per_frame))
    }

    /// Authoring: the entity joins the culling population.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the id is not alive.
    pub fn attach_population_tag(&mut self, id: EntityId) -> EcsResult<()> {
        self.add_tag::<PopulationTag>(id)
    }

    // =========================================================================
    // Queries & columns
    // =========================================================================

    /// Iterates over alive entities carrying every ID in `set`, in
    /// enumeration (slot) order.
    pub fn query(&self, set: ComponentSet) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(move |entity| entity.matches(set))
            .map(|entity| entity.id)
    }

    /// Counts alive entities carrying every ID in `set`.
    #[must_use]
    pub fn count(&self, set: ComponentSet) -> usize {
        self.entities.iter().filter(|entity| entity.matches(set)).count()
    }

    /// Iterates over alive entities that carry `C`, with the component.
    pub fn iter_with<C: Column>(&self) -> impl Iterator<Item = (EntityId, &C)> + '_ {
        let column = C::column(self).as_slice();
        self.entities
            .iter()
            .zip(column)
            .filter(|(entity, _)| entity.alive && entity.has_component(C::ID))
            .map(|(entity, component)| (entity.id, component))
    }

    /// The whole column for `C`, one value per slot.
    #[inline]
    #[must_use]
    pub fn column<C: Column>(&self) -> &[C] {
        C::column(self).as_slice()
    }

    /// The whole column for `C`, mutably.
    #[inline]
    pub fn column_mut<C: Column>(&mut self) -> &mut [C] {
        C::column_mut(self).as_mut_slice()
    }

    /// Entity slots alongside a mutable column, for single-pass
    /// read-mask/write-value loops.
    #[inline]
    pub fn split_column_mut<C: Column>(&mut self) -> (&[Entity], &mut [C]) {
        let (entities, column) = C::split_mut(self);
        (entities, column.as_mut_slice())
    }

    // =========================================================================
    // Templates
    // =========================================================================

    /// Registers a blueprint.
    pub fn register_template(&mut self, blueprint: Blueprint) -> TemplateId {
        self.templates.register(blueprint)
    }

    /// The template registry.
    #[inline]
    #[must_use]
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Instantiates `out.len()` entities from `template`, writing their ids
    /// into `out` in creation order.
    ///
    /// The template and free capacity are checked up front: on error no
    /// entity has been created.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownTemplate`] or [`EcsError::CapacityExhausted`].
    pub fn instantiate(&mut self, template: TemplateId, out: &mut [EntityId]) -> EcsResult<()> {
        let blueprint = *self.templates.get(template)?;
        if out.len() > self.free_indices.len() {
            return Err(EcsError::CapacityExhausted {
                capacity: self.capacity,
            });
        }

        for slot in out.iter_mut() {
            let id = self.spawn()?;
            self.stamp(id, &blueprint)?;
            *slot = id;
        }
        Ok(())
    }

    fn stamp(&mut self, id: EntityId, blueprint: &Blueprint) -> EcsResult<()> {
        self.insert(id, blueprint.position)?;
        if let Some(countdown) = blueprint.countdown {
            self.insert(id, countdown)?;
        }
        if let Some(spawn) = blueprint.spawn {
            self.insert(id, spawn)?;
        }
        if blueprint.population {
            self.add_tag::<PopulationTag>(id)?;
        }
        Ok(())
    }
}
