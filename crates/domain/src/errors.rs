//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Nimbus
///
/// `Clone` because a single failed fetch is delivered to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum NimbusError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NimbusError {
    /// Whether the error came from talking to the upstream provider
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited(_) | Self::Timeout(_))
    }

    /// Short label for structured log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::RateLimited(_) => "rate_limited",
            Self::Timeout(_) => "timeout",
            Self::NotFound(_) => "not_found",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Nimbus operations
pub type Result<T> = std::result::Result<T, NimbusError>;
