//! # Pass Scheduling Primitives
//!
//! Work inside a frame is split into passes. Each pass declares which
//! components it reads and writes:
//!
//! ```text
//! Pass A: reads {Position, PopulationTag}      ┐
//!                                              ├─ no write overlap → run concurrently
//! Pass B: reads {Position, SpawnRequest}       ┘
//!
//! Pass C: writes {Countdown}                   ┐
//!                                              ├─ overlap → run in declaration order
//! Pass D: reads {Countdown}                    ┘
//! ```
//!
//! Dependencies are explicit: a pass runs when its call returns, and a pair
//! is done when [`run_pair`] / [`join`] returns. There are no handles to
//! forget.

mod pass;

pub use pass::{join, run_pair, Access, Pass};
