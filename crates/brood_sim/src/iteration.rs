//! # Iteration Controller
//!
//! Splits the frame stream into fixed-length iterations:
//!
//! ```text
//! countdown:  3 2 1 0 | F 3 2 1 0 | F 3 ...    (frames_per_iteration = 4)
//!                       ^ finalizing frame, countdown resets
//! ```
//!
//! The controller is the only writer of the iteration state and advances it
//! exactly once per frame, before any pipeline reads it.

/// What the pipelines see for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStep {
    /// Countdown after this frame's advance. Also the frame key that seeds
    /// per-frame random streams.
    pub remaining_frames: u32,
    /// True on the one frame that finalizes the iteration.
    pub final_frame: bool,
    /// Iterations completed before this frame.
    pub iteration: u64,
}

/// Counting / finalizing state machine.
#[derive(Clone, Debug)]
pub struct IterationController {
    frames_per_iteration: u32,
    remaining_frames: u32,
    completed: u64,
}

impl IterationController {
    /// Creates a controller in the counting state.
    ///
    /// `initial_countdown` is the remaining-frame value before the first
    /// advance.
    #[must_use]
    pub const fn new(frames_per_iteration: u32, initial_countdown: u32) -> Self {
        Self {
            frames_per_iteration,
            remaining_frames: initial_countdown,
            completed: 0,
        }
    }

    /// Advances one frame.
    ///
    /// A countdown that already reached zero makes this the finalizing
    /// frame and resets to the iteration length; anything else decrements.
    pub fn advance(&mut self) -> FrameStep {
        let iteration = self.completed;
        let final_frame = self.remaining_frames == 0;
        if final_frame {
            self.remaining_frames = self.frames_per_iteration;
            self.completed += 1;
        } else {
            self.remaining_frames -= 1;
        }

        FrameStep {
            remaining_frames: self.remaining_frames,
            final_frame,
            iteration,
        }
    }

    /// Remaining frames as of the last advance.
    #[inline]
    #[must_use]
    pub const fn remaining_frames(&self) -> u32 {
        self.remaining_frames
    }

    /// Iterations finalized so far.
    #[inline]
    #[must_use]
    pub const fn completed_iterations(&self) -> u64 {
        self.completed
    }

    /// Configured iteration length.
    #[inline]
    #[must_use]
    pub const fn frames_per_iteration(&self) -> u32 {
        self.frames_per_iteration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_iteration() {
        let mut controller = IterationController::new(4, 4);
        let steps: Vec<FrameStep> = (0..5).map(|_| controller.advance()).collect();

        assert_eq!(
            steps.iter().map(|s| s.remaining_frames).collect::<Vec<_>>(),
            vec![3, 2, 1, 0, 4]
        );
        assert_eq!(steps.iter().filter(|s| s.final_frame).count(), 1);
        assert!(steps[4].final_frame);
        assert_eq!(steps[4].iteration, 0);
        assert_eq!(controller.completed_iterations(), 1);
    }

    #[test]
    fn test_steady_state_period() {
        let mut controller = IterationController::new(3, 3);
        let finals: Vec<usize> = (0..12)
            .map(|_| controller.advance())
            .enumerate()
            .filter(|(_, s)| s.final_frame)
            .map(|(i, _)| i)
            .collect();

        assert_eq!(finals, vec![3, 7, 11]);
    }

    #[test]
    fn test_reset_after_finalize() {
        let mut controller = IterationController::new(5, 1);
        assert!(!controller.advance().final_frame);

        let last = controller.advance();
        assert!(last.final_frame);
        assert_eq!(last.remaining_frames, 5);
        assert_eq!(last.iteration, 0);

        let next = controller.advance();
        assert_eq!(next.remaining_frames, 4);
        assert!(!next.final_frame);
        assert_eq!(next.iteration, 1);
    }

    #[test]
    fn test_single_frame_iterations() {
        let mut controller = IterationController::new(1, 1);
        let finals = (0..6).filter(|_| controller.advance().final_frame).count();
        assert_eq!(finals, 3);
    }
}
