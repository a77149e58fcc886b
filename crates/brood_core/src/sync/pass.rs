//! # Passes
//!
//! A pass is a closure plus its declared component access.

use crate::ecs::ComponentSet;

/// Components a pass reads and writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Access {
    /// Components read.
    pub reads: ComponentSet,
    /// Components written.
    pub writes: ComponentSet,
}

impl Access {
    /// Access touching nothing.
    pub const NONE: Self = Self {
        reads: ComponentSet::EMPTY,
        writes: ComponentSet::EMPTY,
    };

    /// Read-only access to `ids`.
    #[must_use]
    pub const fn read(ids: &[u8]) -> Self {
        Self {
            reads: ComponentSet::of(ids),
            writes: ComponentSet::EMPTY,
        }
    }

    /// Adds write access to `ids`.
    #[must_use]
    pub const fn and_write(self, ids: &[u8]) -> Self {
        Self {
            reads: self.reads,
            writes: self.writes.union(ComponentSet::of(ids)),
        }
    }

    /// Reads never conflict with reads. A write conflicts with any read or
    /// write of the same component.
    #[inline]
    #[must_use]
    pub const fn conflicts_with(self, other: Self) -> bool {
        self.writes.intersects(other.reads.union(other.writes))
            || other.writes.intersects(self.reads)
    }
}

/// A named unit of work with declared access.
pub struct Pass<F> {
    name: &'static str,
    access: Access,
    body: F,
}

impl<F, R> Pass<F>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    /// Creates a pass.
    pub const fn new(name: &'static str, access: Access, body: F) -> Self {
        Self { name, access, body }
    }

    /// Pass name, for logs.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared access.
    #[inline]
    #[must_use]
    pub const fn access(&self) -> Access {
        self.access
    }

    /// Runs the pass on the current thread.
    pub fn run(self) -> R {
        tracing::trace!(pass = self.name, "running pass");
        (self.body)()
    }
}

/// Runs two passes, concurrently when their access does not conflict and
/// in declaration order (`a` then `b`) when it does. Returns once both are
/// complete.
pub fn run_pair<FA, RA, FB, RB>(a: Pass<FA>, b: Pass<FB>) -> (RA, RB)
where
    FA: FnOnce() -> RA + Send,
    RA: Send,
    FB: FnOnce() -> RB + Send,
    RB: Send,
{
    if a.access.conflicts_with(b.access) {
        tracing::trace!(
            first = a.name,
            second = b.name,
            "access conflict, serializing passes"
        );
        let ra = a.run();
        let rb = b.run();
        (ra, rb)
    } else {
        rayon::join(|| a.run(), || b.run())
    }
}

/// Runs two closures potentially in parallel and waits for both.
#[inline]
pub fn join<A, RA, B, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    RA: Send,
    B: FnOnce() -> RB + Send,
    RB: Send,
{
    rayon::join(a, b)
}
