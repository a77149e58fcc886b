//! # Deterministic Randomness & Hashing
//!
//! Every random decision is drawn from a stream keyed by
//! `(seed, index, frame_key)`. Streams carry no shared state, so the same
//! key yields the same sequence no matter which worker asks for it or in
//! which order.
//!
//! The hashes at the bottom of this module are pure functions over IEEE-754
//! bit patterns, used to fingerprint simulation state.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ecs::Position;

/// Root of all per-entity random streams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RandomSource {
    /// Run seed.
    pub seed: u64,
}

impl RandomSource {
    /// Creates a source for a run seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Opens the stream for `index` (a query rank) at `frame_key`.
    ///
    /// Pure: equal arguments always give an identical stream.
    #[must_use]
    pub fn stream(self, index: usize, frame_key: u32) -> RandomStream {
        let key = mix64(
            mix64(self.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
                ^ u64::from(frame_key),
        );
        RandomStream {
            rng: ChaCha8Rng::seed_from_u64(key),
        }
    }
}

/// A sequential random stream. Draws depend only on the stream's own
/// history.
#[derive(Clone, Debug)]
pub struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    /// Next uniformly distributed `u32`.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    /// Next value in `[lo, hi)`. Returns `lo` when the range is empty.
    #[inline]
    pub fn next_in_range(&mut self, lo: f32, hi: f32) -> f32 {
        if lo < hi {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Next planar offset, each axis in `[-extent, extent)`.
    #[inline]
    pub fn next_offset(&mut self, extent: f32) -> [f32; 2] {
        let dx = self.next_in_range(-extent, extent);
        let dz = self.next_in_range(-extent, extent);
        [dx, dz]
    }
}

/// 64-bit finalizer (splitmix64).
#[inline]
const fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// xxHash32 constants
const PRIME2: u32 = 0x85EB_CA77;
const PRIME3: u32 = 0xC2B2_AE3D;
const PRIME4: u32 = 0x27D4_EB2F;
const PRIME5: u32 = 0x1656_67B1;

#[inline]
const fn avalanche(mut h: u32) -> u32 {
    h ^= h >> 15;
    h = h.wrapping_mul(PRIME2);
    h ^= h >> 13;
    h = h.wrapping_mul(PRIME3);
    h ^ (h >> 16)
}

#[inline]
const fn round(acc: u32, lane: u32) -> u32 {
    acc.wrapping_add(lane.wrapping_mul(PRIME3))
        .rotate_left(17)
        .wrapping_mul(PRIME4)
}

/// Combines two 32-bit values. Order-sensitive.
#[inline]
#[must_use]
pub const fn hash2(a: u32, b: u32) -> u32 {
    let h = PRIME5.wrapping_add(8);
    avalanche(round(round(h, a), b))
}

/// Hashes a position's `x`, `y` and `z` bit patterns.
#[inline]
#[must_use]
pub fn hash_position(position: &Position) -> u32 {
    let h = PRIME5.wrapping_add(12);
    let h = round(h, position.x.to_bits());
    let h = round(h, position.y.to_bits());
    avalanche(round(h, position.z.to_bits()))
}
