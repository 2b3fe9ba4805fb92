//! Logging initialization
//!
//! The whole workspace logs through `tracing`; this module installs the
//! subscriber once at process start.

pub mod logging;

pub use logging::{build_filter, init_tracing};
