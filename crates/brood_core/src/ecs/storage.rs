//! # Component Storage
//!
//! One dense, pre-allocated column per component type.
//!
//! - Every slot exists from creation; a slot's value is meaningful only
//!   while the owning entity is alive and carries the component's mask bit
//! - Access is O(1) via slot index
//! - Whole-column slices allow disjoint parallel writes

use super::component::Component;

/// Pre-allocated column for a single component type.
///
/// # Type Parameters
///
/// * `C` - The component type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut column: ComponentStorage<Countdown> = ComponentStorage::new(1024);
/// column.set(0, Countdown::new(90));
/// ```
pub struct ComponentStorage<C: Component> {
    /// The dense array of components, one per entity slot.
    data: Box<[C]>,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates a column with `capacity` default-initialized slots.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            data: vec![C::default(); capacity].into_boxed_slice(),
        }
    }

    /// Returns the number of slots in this column.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Gets a component by slot index, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)
    }

    /// Overwrites the slot at `index`.
    ///
    /// # Returns
    ///
    /// `true` if the component was set, `false` if index was out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, component: C) -> bool {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = component;
            true
        } else {
            false
        }
    }

    /// Returns the whole column.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// Returns the whole column mutably, for disjoint parallel writes.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.data
    }

    /// Resets a slot to the component's default value.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = C::default();
        }
    }
}
