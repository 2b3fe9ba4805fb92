//! Bounded TTL cache
//!
//! A keyed store bounded in time and in size, used as the storage tier of
//! the weather cache pool.
//!
//! # Features
//!
//! - **Thread-safe**: one `parking_lot::RwLock` per cache serializes
//!   mutations
//! - **TTL**: entries expire at `inserted_at + ttl`; expired entries read as
//!   absent and are removed by [`BoundedTtlCache::sweep_expired`]
//! - **Bounded**: inserting a new key at capacity evicts the oldest insertion
//!   (or the least recently used entry under [`EvictionPolicy::Lru`])
//! - **Metrics**: optional hit/miss/insert/eviction/expiration counters
//! - **Testable**: clock abstraction for deterministic time-based testing
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use nimbus_common::cache::{BoundedTtlCache, CacheConfig};
//!
//! let config = CacheConfig::builder()
//!     .max_size(2)
//!     .ttl(Duration::from_secs(3600))
//!     .build()
//!     .unwrap();
//! let cache: BoundedTtlCache<&str, u32> = BoundedTtlCache::new(config);
//!
//! cache.put("a", 1);
//! cache.put("b", 2);
//! assert_eq!(cache.put("c", 3), Some("a"));
//! assert_eq!(cache.stats().evictions, 1);
//! ```

pub mod config;
pub mod core;
pub mod entry;
pub mod health;
pub mod stats;

pub use config::{CacheConfig, CacheConfigBuilder, EvictionPolicy};
pub use self::core::BoundedTtlCache;
pub use entry::CacheEntry;
pub use health::{CacheHealth, CacheHealthReport};
pub use stats::{CacheStats, MetricsCollector};
