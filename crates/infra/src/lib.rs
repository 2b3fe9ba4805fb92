//! # Nimbus Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Configuration loading (environment variables, TOML/JSON files)
//! - HTTP client with retry support
//! - The QWeather provider adapter
//! - Background workers (expiry sweeper, refresh-ahead)
//! - Logging initialization
//!
//! ## Architecture
//! - Implements traits defined in `nimbus-core`
//! - Contains all "impure" code (network I/O, timers, process environment)

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod qweather;
pub mod scheduling;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, RetryPolicy};
pub use observability::init_tracing;
pub use qweather::QWeatherClient;
pub use scheduling::{ExpirySweeper, RefreshAheadWorker, SchedulerError, SchedulerResult};
