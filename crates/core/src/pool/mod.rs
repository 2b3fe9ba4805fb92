//! Cache pool: bounded TTL caches with single-flight upstream fetching

pub mod cache_pool;
pub mod coordinator;
pub mod stats;

pub use cache_pool::CachePool;
pub use coordinator::{Fetched, RefreshCoordinator};
pub use stats::{FetchCounters, FetchStats, StatsCollector};
