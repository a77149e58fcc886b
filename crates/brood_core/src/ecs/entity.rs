//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into component arrays
//! - A generation counter that invalidates old ids when a slot is reused

use std::fmt;

use super::component::ComponentSet;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into component arrays
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The index into component arrays (0 to 2^32-1)
    /// * `generation` - The generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the slot index as a `usize`, ready for column access.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self.index() as usize
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// One entity slot: its current id, attached-component mask and liveness.
#[derive(Clone, Copy, Debug)]
pub struct Entity {
    /// The identifier currently issued for this slot.
    pub id: EntityId,
    /// Components and tags attached to the entity.
    pub components: ComponentSet,
    /// Whether this entity slot is currently alive.
    pub alive: bool,
}

impl Entity {
    /// Creates a new, empty, alive entity.
    #[inline]
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            components: ComponentSet::EMPTY,
            alive: true,
        }
    }

    /// Creates a dead slot that has never been issued.
    #[inline]
    #[must_use]
    pub const fn dead() -> Self {
        Self {
            id: EntityId::NULL,
            components: ComponentSet::EMPTY,
            alive: false,
        }
    }

    /// Checks if this entity has a specific component.
    ///
    /// # Arguments
    ///
    /// * `component_id` - The component type ID (0-63)
    #[inline]
    #[must_use]
    pub const fn has_component(self, component_id: u8) -> bool {
        self.components.contains_id(component_id)
    }

    /// Returns true if the slot is alive and carries every component in `set`.
    #[inline]
    #[must_use]
    pub const fn matches(self, set: ComponentSet) -> bool {
        self.alive && self.components.contains_all(set)
    }

    /// Adds a component flag to this entity.
    #[inline]
    pub fn add_component(&mut self, component_id: u8) {
        self.components = self.components.with_id(component_id);
    }

    /// Removes a component flag from this entity.
    #[inline]
    pub fn remove_component(&mut self, component_id: u8) {
        self.components = self.components.without_id(component_id);
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::dead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert_eq!(id.slot(), 12345);
    }

    #[test]
    fn test_null_id() {
        assert!(EntityId::default().is_null());
        assert!(!EntityId::new(0, 0).is_null());
        assert_eq!(EntityId::NULL.to_string(), "null");
        assert_eq!(EntityId::new(7, 2).to_string(), "7v2");
    }

    #[test]
    fn test_entity_component_mask() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        assert!(!entity.has_component(5));

        entity.add_component(5);
        assert!(entity.has_component(5));
        assert!(entity.matches(ComponentSet::EMPTY.with_id(5)));

        entity.remove_component(5);
        assert!(!entity.has_component(5));
    }

    #[test]
    fn test_dead_slot_never_matches() {
        let mut entity = Entity::dead();
        entity.add_component(1);
        assert!(!entity.matches(ComponentSet::EMPTY.with_id(1)));
    }
}
