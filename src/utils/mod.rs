//! Utility functions and helpers for rhgate.
//!
//! # Submodules
//!
//! - `clock`: Millisecond wall clock, swappable for tests.
//! - `logging`: Tracing initialization and API key redaction.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod clock;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
