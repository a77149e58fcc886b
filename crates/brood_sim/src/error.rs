//! # Simulation Error Types
//!
//! All errors that can abort a run. Every one of them is fatal: there is no
//! retry, and a scheduler that returned one refuses further ticks.

use std::path::PathBuf;

use brood_core::{EcsError, EntityId, TemplateId};
use thiserror::Error;

/// Errors that can occur while loading or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// Store or buffer failure (stale id, capacity, bounds).
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A spawner references a template that was never registered.
    #[error("spawner {spawner} references unregistered template {template}")]
    UnresolvedTemplate {
        /// The offending spawner.
        spawner: EntityId,
        /// The missing template.
        template: TemplateId,
    },

    /// A scenario references a template name it does not define.
    #[error("unknown template name: {0:?}")]
    UnknownTemplateName(String),

    /// A config or scenario file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A config or scenario file is not valid TOML for its schema.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// A previous tick failed; the world may be partially mutated.
    #[error("scheduler is poisoned by an earlier failed frame")]
    Poisoned,
}

impl SimError {
    /// Returns true for errors detected before any world mutation.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_)
                | Self::UnresolvedTemplate { .. }
                | Self::UnknownTemplateName(_)
                | Self::Io { .. }
                | Self::Toml(_)
        )
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
