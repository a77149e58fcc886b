//! # Iteration Finalizer
//!
//! Runs on finalizing frames only. Fingerprints every positioned entity,
//! logs the fingerprint, then purges the population for the next iteration.
//!
//! Two checksums are taken over the same positions:
//! - **ordered**: `hash2` folded strictly in enumeration order. Sensitive to
//!   creation/destroy order.
//! - **unordered**: wrapping sum of position hashes. Only sensitive to the
//!   multiset of positions.

use std::sync::atomic::{AtomicU32, Ordering};

use brood_core::{
    hash2, hash_position, join, Component, ComponentSet, PopulationTag, Position, Tag, World,
};
use rayon::prelude::*;

use crate::error::SimResult;
use crate::feed::{ChecksumSink, IterationChecksum};

/// Positions per chunk in the unordered reduction.
const CHECKSUM_CHUNK: usize = 1024;

const POPULATION: ComponentSet = ComponentSet::of(&[PopulationTag::ID]);

/// Ordered fold: `acc = hash2(acc, hash_position(p))` from 0.
#[must_use]
pub fn ordered_hash(positions: &[Position]) -> u32 {
    positions
        .iter()
        .fold(0, |acc, position| hash2(acc, hash_position(position)))
}

/// Commutative sum of position hashes, reduced in parallel.
#[must_use]
pub fn unordered_checksum(positions: &[Position]) -> u32 {
    let total = AtomicU32::new(0);
    positions.par_chunks(CHECKSUM_CHUNK).for_each(|chunk| {
        let partial = chunk
            .iter()
            .fold(0u32, |acc, position| acc.wrapping_add(hash_position(position)));
        // fetch_add wraps on overflow
        total.fetch_add(partial, Ordering::Relaxed);
    });
    total.into_inner()
}

/// Checksums and purges at iteration boundaries.
#[derive(Debug, Default)]
pub struct IterationFinalizer {
    sink: Option<ChecksumSink>,
}

impl IterationFinalizer {
    /// Creates a finalizer that only logs.
    #[must_use]
    pub const fn new() -> Self {
        Self { sink: None }
    }

    /// Also publishes every checksum to `sink`.
    #[must_use]
    pub fn with_sink(sink: ChecksumSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Attaches or replaces the sink.
    pub fn set_sink(&mut self, sink: ChecksumSink) {
        self.sink = Some(sink);
    }

    /// Computes both checksums over the current positions, concurrently.
    #[must_use]
    pub fn checksum(&self, world: &World, iteration: u64) -> IterationChecksum {
        let positions: Vec<Position> = world.iter_with::<Position>().map(|(_, p)| *p).collect();
        let (ordered, unordered) = join(
            || ordered_hash(&positions),
            || unordered_checksum(&positions),
        );
        IterationChecksum {
            iteration,
            ordered_hash: ordered,
            unordered_checksum: unordered,
            surviving: positions.len(),
        }
    }

    /// Checksums, logs, publishes, then destroys every population member.
    ///
    /// # Returns
    ///
    /// The checksum and the number of entities purged.
    ///
    /// # Errors
    ///
    /// Store errors from the purge. The checksum has already been logged.
    pub fn finalize(
        &self,
        world: &mut World,
        iteration: u64,
    ) -> SimResult<(IterationChecksum, usize)> {
        let record = self.checksum(world, iteration);
        tracing::info!(
            "Ordered hash: {}, unordered checksum: {}",
            record.ordered_hash,
            record.unordered_checksum
        );
        if let Some(sink) = &self.sink {
            sink.publish(record);
        }

        let purged = world.despawn_matching(POPULATION)?;
        tracing::debug!(iteration, purged, surviving = record.surviving, "iteration finalized");
        Ok((record, purged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::checksum_channel;
    use brood_core::{Blueprint, EntityId};

    fn positions(n: usize) -> Vec<Position> {
        (0..n)
            .map(|i| Position::on_plane(i as f32 * 1.5, -(i as f32)))
            .collect()
    }

    #[test]
    fn test_empty_checksums() {
        assert_eq!(ordered_hash(&[]), 0);
        assert_eq!(unordered_checksum(&[]), 0);
    }

    #[test]
    fn test_unordered_matches_sequential_sum() {
        let ps = positions(5000);
        let sequential = ps
            .iter()
            .fold(0u32, |acc, p| acc.wrapping_add(hash_position(p)));
        assert_eq!(unordered_checksum(&ps), sequential);
    }

    #[test]
    fn test_unordered_is_permutation_invariant() {
        let ps = positions(3000);
        let mut shuffled = ps.clone();
        shuffled.reverse();
        shuffled.swap(0, 1500);

        assert_eq!(unordered_checksum(&ps), unordered_checksum(&shuffled));
        assert_ne!(ordered_hash(&ps), ordered_hash(&shuffled));
    }

    #[test]
    fn test_finalize_purges_population_only() {
        let mut world = World::new(64);
        let subject = world.register_template(Blueprint::default().with_population());
        let marker = world.register_template(Blueprint::new(Position::new(1.0, 2.0, 3.0)));
        let mut subjects = [EntityId::NULL; 10];
        world.instantiate(subject, &mut subjects).unwrap();
        let mut markers = [EntityId::NULL; 2];
        world.instantiate(marker, &mut markers).unwrap();

        let (sink, feed) = checksum_channel(2);
        let finalizer = IterationFinalizer::with_sink(sink);
        let (record, purged) = finalizer.finalize(&mut world, 4).unwrap();

        assert_eq!(purged, 10);
        assert_eq!(record.surviving, 12);
        assert_eq!(record.iteration, 4);
        assert_eq!(world.count(POPULATION), 0);
        assert_eq!(world.alive_count(), 2);
        assert_eq!(feed.try_recv(), Some(record));
    }

    #[test]
    fn test_checksum_follows_enumeration_order() {
        let mut world = World::new(8);
        let ps = positions(4);
        for p in &ps {
            let id = world.spawn().unwrap();
            world.insert(id, *p).unwrap();
        }
        let record = IterationFinalizer::new().checksum(&world, 0);
        assert_eq!(record.ordered_hash, ordered_hash(&ps));
        assert_eq!(record.unordered_checksum, unordered_checksum(&ps));
    }
}
