//! # Memory Management
//!
//! Fixed-capacity buffers for per-frame scratch data.
//!
//! Capacity is decided once, from a count known up front (a query size, a
//! planned spawn total). Overflowing a buffer is an error, never a silent
//! reallocation.

mod fixed_list;

pub use fixed_list::FixedList;
