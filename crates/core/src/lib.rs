//! # Nimbus Core
//!
//! Cache pool logic - no network or platform code.
//!
//! This crate contains:
//! - The single-flight [`RefreshCoordinator`] over bounded TTL caches
//! - The two-tier [`CachePool`] (weather by location, city by name)
//! - Provider ports ([`CityLookup`], [`WeatherFetcher`]) implemented in
//!   `nimbus-infra`
//! - The caller-facing [`WeatherService`]
//!
//! ## Architecture Principles
//! - Only depends on `nimbus-common` and `nimbus-domain`
//! - All upstream access goes through the port traits
//! - The pool is constructed explicitly and shared by `Arc`; there is no
//!   global instance

pub mod pool;
pub mod weather;

pub use pool::{CachePool, FetchStats, Fetched, RefreshCoordinator, StatsCollector};
pub use weather::{CacheKey, CityLookup, WeatherFetcher, WeatherService};
