//! Time abstractions
//!
//! - **[`clock`]**: real and mock clocks used for TTL bookkeeping

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
