//! # Component System
//!
//! Components are pure data containers with no behavior.
//! They must be Copy and have a fixed size for pre-allocated storage.
//! Tags carry no data at all and only occupy a bit in the entity mask.

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Marker trait for stored ECS components.
///
/// Components must be:
/// - `Copy`: No heap allocations, bitwise copyable
/// - `Pod`: Plain old data, safe to transmute
/// - `Zeroable`: Can be safely zeroed
/// - `Default`: Must have a default value for pre-allocation
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Heat {
///     kelvin: f32,
/// }
///
/// impl Component for Heat {
///     const ID: u8 = 9;
///     const NAME: &'static str = "Heat";
/// }
/// ```
pub trait Component: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// Unique identifier for this component type (0-63).
    ///
    /// This ID is used for the component bitmask in entities.
    const ID: u8;
    /// Human-readable name used in error messages.
    const NAME: &'static str;
}

/// Marker trait for data-less tags.
///
/// Tags share the component ID space (0-63) but have no column.
pub trait Tag: Send + Sync + 'static {
    /// Unique identifier for this tag (0-63), disjoint from component IDs.
    const ID: u8;
    /// Human-readable name used in error messages.
    const NAME: &'static str;
}

/// A set of component and tag IDs, stored as a 64-bit mask.
///
/// Used both as the per-entity attachment mask and as a query filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentSet(u64);

impl ComponentSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Builds a set from a list of component or tag IDs.
    #[must_use]
    pub const fn of(ids: &[u8]) -> Self {
        let mut mask = 0u64;
        let mut i = 0;
        while i < ids.len() {
            mask |= 1 << ids[i];
            i += 1;
        }
        Self(mask)
    }

    /// Returns a copy of this set with `id` added.
    #[inline]
    #[must_use]
    pub const fn with_id(self, id: u8) -> Self {
        Self(self.0 | (1 << id))
    }

    /// Returns a copy of this set with `id` removed.
    #[inline]
    #[must_use]
    pub const fn without_id(self, id: u8) -> Self {
        Self(self.0 & !(1 << id))
    }

    /// Checks membership of a single ID.
    #[inline]
    #[must_use]
    pub const fn contains_id(self, id: u8) -> bool {
        self.0 & (1 << id) != 0
    }

    /// Checks that every ID of `other` is in this set.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks whether the two sets share at least one ID.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true if no ID is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw mask bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }
}

/// Position component for entities.
///
/// Represents a 3D position in world space. Spawn placement is planar and
/// lives on the x/z plane with `y = 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// X coordinate in world space.
    pub x: f32,
    /// Y coordinate in world space.
    pub y: f32,
    /// Z coordinate in world space.
    pub z: f32,
    /// Padding for alignment (ensures 16-byte alignment for SIMD).
    pub _padding: f32,
}

impl Component for Position {
    const ID: u8 = 0;
    const NAME: &'static str = "Position";
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            _padding: 0.0,
        }
    }

    /// Lifts a planar `(x, z)` coordinate into world space at `y = 0`.
    #[inline]
    #[must_use]
    pub const fn on_plane(x: f32, z: f32) -> Self {
        Self::new(x, 0.0, z)
    }
}

/// Remaining-frame countdown. The entity is retired once it runs out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Countdown {
    /// Frames left before the entity expires.
    pub frames: u32,
}

impl Component for Countdown {
    const ID: u8 = 1;
    const NAME: &'static str = "Countdown";
}

impl Countdown {
    /// Creates a countdown of `frames`.
    #[inline]
    #[must_use]
    pub const fn new(frames: u32) -> Self {
        Self { frames }
    }
}

/// Handle to a registered entity template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct TemplateId(pub u32);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-frame instantiation request carried by a spawner entity.
///
/// Authored externally, read-only to the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct SpawnRequest {
    /// Template to instantiate.
    pub template: TemplateId,
    /// Instances to create every frame.
    pub count_per_frame: u32,
}

impl Component for SpawnRequest {
    const ID: u8 = 2;
    const NAME: &'static str = "SpawnRequest";
}

impl SpawnRequest {
    /// Creates a spawn request.
    #[inline]
    #[must_use]
    pub const fn new(template: TemplateId, count_per_frame: u32) -> Self {
        Self {
            template,
            count_per_frame,
        }
    }
}

/// Membership in the culling population.
///
/// Everything carrying this tag is subject to per-frame culling and is
/// purged when an iteration finalizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationTag;

impl Tag for PopulationTag {
    const ID: u8 = 3;
    const NAME: &'static str = "PopulationTag";
}
