//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! seed = 7
//! frames_per_iteration = 120
//! cull_fraction = 0.75
//! spawn_extent = 100.0
//! workers = 4
//! ```

use std::num::NonZeroUsize;
use std::path::Path;

use serde::Deserialize;

use crate::error::{SimError, SimResult};

/// Default iteration length in frames.
pub const DEFAULT_FRAMES_PER_ITERATION: u32 = 120;

/// Default fraction of the population culled every frame.
pub const DEFAULT_CULL_FRACTION: f64 = 0.75;

/// Default half-width of the spawn placement square.
pub const DEFAULT_SPAWN_EXTENT: f32 = 100.0;

/// Default entity store capacity.
pub const DEFAULT_CAPACITY: usize = 1 << 20;

/// Scheduler configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Seed for every random stream.
    pub seed: u64,
    /// Countdown each iteration restarts from. An iteration runs this many
    /// counting frames plus its finalizing frame.
    pub frames_per_iteration: u32,
    /// Countdown of the very first iteration. `None` uses
    /// `frames_per_iteration`, `Some(0)` finalizes on the first frame.
    pub first_iteration_frames: Option<u32>,
    /// Probability that a population member is culled in a frame.
    pub cull_fraction: f64,
    /// Spawn offsets are drawn from `[-spawn_extent, spawn_extent)` per axis.
    pub spawn_extent: f32,
    /// Worker threads in the pool.
    pub workers: usize,
    /// Entity store capacity.
    pub capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            frames_per_iteration: DEFAULT_FRAMES_PER_ITERATION,
            first_iteration_frames: None,
            cull_fraction: DEFAULT_CULL_FRACTION,
            spawn_extent: DEFAULT_SPAWN_EXTENT,
            workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl SimConfig {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// [`SimError::Toml`] on malformed input or unknown keys,
    /// [`SimError::InvalidConfig`] on out-of-range values.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] if the file cannot be read, otherwise as
    /// [`SimConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every value range.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> SimResult<()> {
        if self.frames_per_iteration == 0 {
            return Err(invalid("frames_per_iteration must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.cull_fraction) {
            return Err(invalid(format!(
                "cull_fraction must be within [0, 1], got {}",
                self.cull_fraction
            )));
        }
        if !(self.spawn_extent.is_finite() && self.spawn_extent > 0.0) {
            return Err(invalid(format!(
                "spawn_extent must be positive, got {}",
                self.spawn_extent
            )));
        }
        if self.workers == 0 {
            return Err(invalid("workers must be at least 1"));
        }
        check_capacity(self.capacity)
    }

    /// Countdown the controller starts from.
    #[must_use]
    pub fn initial_countdown(&self) -> u32 {
        self.first_iteration_frames
            .unwrap_or(self.frames_per_iteration)
    }

    /// Draws below this value are culled.
    ///
    /// Scaled from `u32::MAX / 4`, so the default fraction gives exactly
    /// `u32::MAX / 4 * 3`. A fraction of 1 maps to `u32::MAX`; only a draw
    /// of exactly `u32::MAX` survives it.
    #[must_use]
    pub fn cull_threshold(&self) -> u32 {
        if self.cull_fraction >= 1.0 {
            return u32::MAX;
        }
        let quarter = f64::from(u32::MAX / 4);
        let threshold = (quarter * 4.0 * self.cull_fraction).floor();
        // Float-to-int casts saturate
        threshold as u32
    }
}

/// Store capacity must be addressable by a 32-bit slot index.
pub(crate) fn check_capacity(capacity: usize) -> SimResult<()> {
    if capacity == 0 || u32::try_from(capacity).is_err() {
        return Err(invalid(format!(
            "capacity must be within [1, {}], got {capacity}",
            u32::MAX
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> SimError {
    SimError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        config.validate().unwrap();
        assert_eq!(config.frames_per_iteration, 120);
        assert_eq!(config.initial_countdown(), 120);
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(SimConfig::default().cull_threshold(), u32::MAX / 4 * 3);

        let none = SimConfig {
            cull_fraction: 0.0,
            ..SimConfig::default()
        };
        assert_eq!(none.cull_threshold(), 0);

        let all = SimConfig {
            cull_fraction: 1.0,
            ..SimConfig::default()
        };
        assert_eq!(all.cull_threshold(), u32::MAX);

        let half = SimConfig {
            cull_fraction: 0.5,
            ..SimConfig::default()
        };
        assert_eq!(half.cull_threshold(), u32::MAX / 4 * 2);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = SimConfig::from_toml_str(
            "seed = 7\nframes_per_iteration = 10\nfirst_iteration_frames = 1\nworkers = 2\n",
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.initial_countdown(), 1);
        assert_eq!(config.workers, 2);
        assert_eq!(config.spawn_extent, DEFAULT_SPAWN_EXTENT);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            SimConfig::from_toml_str("seeed = 1\n"),
            Err(SimError::Toml(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        for text in [
            "frames_per_iteration = 0",
            "cull_fraction = 1.5",
            "cull_fraction = -0.1",
            "spawn_extent = 0.0",
            "workers = 0",
            "capacity = 0",
        ] {
            let result = SimConfig::from_toml_str(text);
            assert!(
                matches!(result, Err(SimError::InvalidConfig(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let err = SimConfig::load("/nonexistent/brood.toml").unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }
}
