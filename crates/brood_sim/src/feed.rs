//! # Checksum Feed
//!
//! Finalized iteration checksums for consumers outside the scheduler
//! (a verifier, a replay harness).
//!
//! The channel is bounded. Publishing never blocks the frame: when the
//! channel is full or the consumer is gone the record is dropped and
//! counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Fingerprint of the world at the end of an iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IterationChecksum {
    /// Zero-based iteration number.
    pub iteration: u64,
    /// Position hashes folded in enumeration order.
    pub ordered_hash: u32,
    /// Wrapping sum of position hashes.
    pub unordered_checksum: u32,
    /// Entities carrying a position when the checksum was taken.
    pub surviving: usize,
}

/// Producer half, held by the scheduler.
#[derive(Clone, Debug)]
pub struct ChecksumSink {
    sender: Sender<IterationChecksum>,
    dropped: Arc<AtomicU64>,
}

/// Consumer half.
#[derive(Clone, Debug)]
pub struct ChecksumFeed {
    receiver: Receiver<IterationChecksum>,
    dropped: Arc<AtomicU64>,
}

/// Creates a connected sink/feed pair holding at most `capacity` records.
#[must_use]
pub fn checksum_channel(capacity: usize) -> (ChecksumSink, ChecksumFeed) {
    let (sender, receiver) = bounded(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        ChecksumSink {
            sender,
            dropped: Arc::clone(&dropped),
        },
        ChecksumFeed { receiver, dropped },
    )
}

impl ChecksumSink {
    /// Publishes a record without blocking.
    ///
    /// Returns `false` if the record was dropped.
    pub fn publish(&self, record: IterationChecksum) -> bool {
        match self.sender.try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(iteration = record.iteration, "checksum feed full, record dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Records dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ChecksumFeed {
    /// Takes the next record, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<IterationChecksum> {
        self.receiver.try_recv().ok()
    }

    /// Takes every pending record.
    #[must_use]
    pub fn drain(&self) -> Vec<IterationChecksum> {
        self.receiver.try_iter().collect()
    }

    /// Records dropped by the producer so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
