//! # Nimbus App
//!
//! Application layer - wiring and the `nimbus` command-line entry point.
//!
//! This crate contains:
//! - Application context (dependency injection, worker lifecycle)
//! - Command-line arguments
//! - Text rendering of reports and cache statistics
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Owns the only `CachePool`; everything else receives it by `Arc`

pub mod cli;
pub mod context;
pub mod render;

pub use cli::Cli;
pub use context::AppContext;
