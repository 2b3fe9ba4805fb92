//! # Nimbus Domain
//!
//! Business domain types for the Nimbus weather cache pool.
//!
//! This crate contains:
//! - Weather and city data types returned by providers
//! - Domain error types and Result definitions
//! - Configuration structures and their validation
//! - Domain constants (defaults)
//!
//! ## Architecture
//! - No dependencies on other Nimbus crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
