//! A stored value plus its lifecycle metadata

use std::time::{Duration, Instant};

/// Upper bound applied to TTLs so `inserted_at + ttl` cannot overflow
pub(crate) const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Entry stored in a [`BoundedTtlCache`](super::BoundedTtlCache)
///
/// Entries are immutable once stored apart from `last_accessed` and the
/// `refreshing` flag; a refresh replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    pub(crate) value: V,
    pub(crate) inserted_at: Instant,
    pub(crate) expires_at: Instant,
    pub(crate) last_accessed: Instant,
    pub(crate) sequence: u64,
    pub(crate) refreshing: bool,
}

impl<V> CacheEntry<V> {
    pub(crate) fn new(value: V, now: Instant, ttl: Duration, sequence: u64) -> Self {
        let ttl = ttl.min(MAX_TTL);
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        Self { value, inserted_at: now, expires_at, last_accessed: now, sequence, refreshing: false }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn last_accessed(&self) -> Instant {
        self.last_accessed
    }

    /// Insertion sequence number; strictly increasing per cache
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether a background refresh for this entry is in flight
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// An entry is valid while `now < expires_at`
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// Lifetime left at `now`, zero once expired
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// Configured lifetime of this entry
    pub fn ttl(&self) -> Duration {
        self.expires_at.duration_since(self.inserted_at)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::entry.
    use super::*;

    /// Validates `CacheEntry::is_valid_at` around the expiry boundary.
    ///
    /// Assertions:
    /// - Ensures the entry is valid one nanosecond before expiry.
    /// - Ensures the entry is invalid exactly at `expires_at`.
    #[test]
    fn test_validity_boundary() {
        let now = Instant::now();
        let entry = CacheEntry::new("sunny", now, Duration::from_secs(10), 0);

        assert!(entry.is_valid_at(now + Duration::from_secs(10) - Duration::from_nanos(1)));
        assert!(!entry.is_valid_at(now + Duration::from_secs(10)));
        assert_eq!(entry.ttl(), Duration::from_secs(10));
    }

    /// Validates `CacheEntry::remaining_at` saturates after expiry.
    ///
    /// Assertions:
    /// - Confirms remaining lifetime counts down, then stays at zero.
    #[test]
    fn test_remaining_saturates() {
        let now = Instant::now();
        let entry = CacheEntry::new(1_u8, now, Duration::from_secs(60), 7);

        assert_eq!(entry.remaining_at(now + Duration::from_secs(45)), Duration::from_secs(15));
        assert_eq!(entry.remaining_at(now + Duration::from_secs(90)), Duration::ZERO);
        assert_eq!(entry.sequence(), 7);
        assert!(!entry.is_refreshing());
    }
}
