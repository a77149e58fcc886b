//! # Store Error Types
//!
//! Everything the entity store and its buffers can reject. All of these are
//! fatal to the frame that raised them.

use thiserror::Error;

use crate::ecs::{EntityId, TemplateId};

/// Errors raised by the entity store and fixed-capacity buffers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The id refers to a destroyed entity, a reused slot, or no slot at all.
    #[error("stale entity reference {0}")]
    StaleEntity(EntityId),

    /// The entity is alive but does not carry the requested component.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// The entity that was queried.
        entity: EntityId,
        /// Name of the missing component type.
        component: &'static str,
    },

    /// Every pre-allocated entity slot is in use.
    #[error("entity store capacity exhausted ({capacity} slots)")]
    CapacityExhausted {
        /// Store capacity.
        capacity: usize,
    },

    /// The template id was never registered.
    #[error("unknown template {0}")]
    UnknownTemplate(TemplateId),

    /// A fixed-capacity buffer was asked to hold more than it was sized for.
    #[error("fixed buffer overflow: capacity {capacity}, requested {requested}")]
    BufferOverflow {
        /// Capacity the buffer was created with.
        capacity: usize,
        /// Length the push or run would have reached.
        requested: usize,
    },

    /// Index past the end of a fixed-capacity buffer.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Buffer length.
        len: usize,
    },

    /// Two buffers that must be parallel have different lengths.
    #[error("length mismatch: expected {expected}, found {actual}")]
    LengthMismatch {
        /// Required length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },
}

/// Result type for store operations.
pub type EcsResult<T> = Result<T, EcsError>;
