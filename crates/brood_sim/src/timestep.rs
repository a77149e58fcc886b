//! # Fixed Timestep
//!
//! Paces `Scheduler::tick()` at 60 Hz for real-time runs.
//!
//! The rate is fixed at startup; there is no runtime setter. Headless runs
//! skip the driver entirely and tick as fast as they can, which produces the
//! same checksums since nothing in a frame depends on wall time.

use std::time::{Duration, Instant};

/// Ticks per second.
pub const TIMESTEP_HZ: u32 = 60;

/// Duration of one tick.
pub const TICK_DURATION: Duration = Duration::from_micros(1_000_000 / TIMESTEP_HZ as u64);

/// Wall-clock pacing for the frame loop.
///
/// Elapsed time is banked between polls; each started tick withdraws one
/// [`TICK_DURATION`]. A slow tick leaves time in the bank, so the following
/// ticks run back to back until the loop catches up.
pub struct FixedTimestep {
    last_poll: Instant,
    /// Wall time not yet spent on ticks.
    owed: Duration,
    ticks: u64,
    late_ticks: u64,
    slowest: Duration,
}

impl FixedTimestep {
    /// Creates a driver whose first tick is due immediately.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_poll: Instant::now(),
            owed: TICK_DURATION,
            ticks: 0,
            late_ticks: 0,
            slowest: Duration::ZERO,
        }
    }

    /// Banks the time since the last poll. Returns true if a tick is due.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.owed += now.duration_since(self.last_poll);
        self.last_poll = now;
        self.owed >= TICK_DURATION
    }

    /// Withdraws one tick and returns its start time, for [`Self::end_tick`].
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.owed = self.owed.saturating_sub(TICK_DURATION);
        self.ticks += 1;
        Instant::now()
    }

    /// Records a finished tick. Ticks over budget are counted and logged.
    pub fn end_tick(&mut self, start: Instant) {
        let took = start.elapsed();
        self.slowest = self.slowest.max(took);
        if took > TICK_DURATION {
            self.late_ticks += 1;
            tracing::warn!(
                tick = self.ticks,
                took_us = took.as_micros() as u64,
                budget_us = TICK_DURATION.as_micros() as u64,
                "late tick"
            );
        }
    }

    /// Sleeps until the next tick is due. Returns at once if one already is.
    pub fn wait_for_next_tick(&self) {
        let banked = self.owed + self.last_poll.elapsed();
        if let Some(remaining) = TICK_DURATION.checked_sub(banked) {
            std::thread::sleep(remaining);
        }
    }

    /// Ticks started so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Ticks that ran longer than [`TICK_DURATION`].
    #[must_use]
    pub const fn late_ticks(&self) -> u64 {
        self.late_ticks
    }

    /// Longest tick recorded.
    #[must_use]
    pub const fn slowest_tick(&self) -> Duration {
        self.slowest
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new()
    }
}
