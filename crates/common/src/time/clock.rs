//! Time abstraction for testability
//!
//! Cache entries record monotonic instants taken from a [`Clock`]. Production
//! code uses [`SystemClock`]; tests drive expiry deterministically with
//! [`MockClock`].
//!
//! ```
//! use std::time::Duration;
//!
//! use nimbus_common::time::{Clock, MockClock};
//!
//! let mock = MockClock::new();
//! let start = mock.now();
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.now().duration_since(start), Duration::from_secs(5));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of monotonic time for TTL bookkeeping
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Real monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock
///
/// Clones share one offset, so a clock handed to a cache can be moved
/// forward from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self { origin: Instant::now(), offset: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Move the clock forward by `duration`
    pub fn advance(&self, duration: Duration) {
        *self.offset.lock() += duration;
    }

    /// Put the clock at `duration` past its creation
    pub fn set_elapsed(&self, duration: Duration) {
        *self.offset.lock() = duration;
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}
