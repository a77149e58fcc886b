//! # Expiration Pipeline
//!
//! Retires entities whose countdown ran out. A countdown of zero expires on
//! its first evaluation.

use brood_core::{Component, ComponentSet, Countdown, EntityId, FixedList, World};
use rayon::prelude::*;

use crate::error::SimResult;

const COUNTDOWNS: ComponentSet = ComponentSet::of(&[Countdown::ID]);

/// Scans and applies countdowns.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpirationPipeline;

impl ExpirationPipeline {
    /// Creates the pipeline.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decrements every countdown and returns the ids that were already at
    /// zero, in enumeration order.
    ///
    /// The column is written in parallel; each worker owns its own slots.
    ///
    /// # Errors
    ///
    /// A bounds error if the expired list overflows the countdown count.
    pub fn plan(&self, world: &mut World) -> SimResult<FixedList<EntityId>> {
        let scanned = world.count(COUNTDOWNS);
        let (entities, countdowns) = world.split_column_mut::<Countdown>();

        let marked: Vec<EntityId> = entities
            .par_iter()
            .zip(countdowns.par_iter_mut())
            .filter_map(|(entity, countdown)| {
                if !entity.matches(COUNTDOWNS) {
                    return None;
                }
                let expired = countdown.frames == 0;
                countdown.frames = countdown.frames.saturating_sub(1);
                expired.then_some(entity.id)
            })
            .collect();

        let mut expired = FixedList::with_capacity(scanned);
        expired.try_extend(marked)?;
        Ok(expired)
    }

    /// Scans, then destroys expired entities.
    ///
    /// # Returns
    ///
    /// Number of entities destroyed.
    ///
    /// # Errors
    ///
    /// Bounds or stale-id errors from the store.
    pub fn run(&self, world: &mut World) -> SimResult<usize> {
        let expired = self.plan(world)?;
        let destroyed = world.despawn_batch(expired.as_slice())?;
        if destroyed > 0 {
            tracing::debug!(expired = destroyed, "countdowns expired");
        }
        Ok(destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_expires_immediately() {
        let mut world = World::new(8);
        let id = world.spawn().unwrap();
        world.attach_countdown(id, 0).unwrap();

        assert_eq!(ExpirationPipeline::new().run(&mut world).unwrap(), 1);
        assert!(!world.is_alive(id));
    }

    #[test]
    fn test_countdown_lifetime() {
        let mut world = World::new(8);
        let id = world.spawn().unwrap();
        world.attach_countdown(id, 2).unwrap();
        let pipeline = ExpirationPipeline::new();

        // 2 -> 1 -> 0 -> expired on the third evaluation
        assert_eq!(pipeline.run(&mut world).unwrap(), 0);
        assert_eq!(world.component::<Countdown>(id), Ok(Countdown::new(1)));
        assert_eq!(pipeline.run(&mut world).unwrap(), 0);
        assert_eq!(world.component::<Countdown>(id), Ok(Countdown::new(0)));
        assert_eq!(pipeline.run(&mut world).unwrap(), 1);
        assert!(!world.is_alive(id));
    }

    #[test]
    fn test_monotonic_and_untouched_without_countdown() {
        let mut world = World::new(16);
        let plain = world.spawn().unwrap();
        let timed: Vec<EntityId> = (0..5)
            .map(|i| {
                let id = world.spawn().unwrap();
                world.attach_countdown(id, 10 + i).unwrap();
                id
            })
            .collect();

        ExpirationPipeline::new().run(&mut world).unwrap();
        for (i, id) in timed.iter().enumerate() {
            assert_eq!(
                world.component::<Countdown>(*id).unwrap().frames,
                9 + i as u32
            );
        }
        assert!(world.component::<Countdown>(plain).is_err());
        assert_eq!(world.column::<Countdown>()[plain.slot()], Countdown::default());
    }

    #[test]
    fn test_expired_in_enumeration_order() {
        let mut world = World::new(16);
        let ids: Vec<EntityId> = (0..6)
            .map(|i| {
                let id = world.spawn().unwrap();
                world.attach_countdown(id, i % 2).unwrap();
                id
            })
            .collect();

        let expired = ExpirationPipeline::new().plan(&mut world).unwrap();
        assert_eq!(expired.as_slice(), &[ids[0], ids[2], ids[4]]);
        assert_eq!(expired.capacity(), 6);
    }
}
