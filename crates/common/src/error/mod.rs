//! Common error types shared by Nimbus crates
//!
//! `CommonError` covers failures of the generic building blocks in this
//! crate. Domain-facing errors live in `nimbus-domain`; adapters classify
//! their own errors through [`ErrorClassification`] so retry and alerting
//! decisions stay uniform.

use std::fmt;
use std::time::Duration;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Severity level used for logging and alerting decisions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ErrorSeverity {
    /// Informational, expected conditions
    Info,
    /// Degraded but operational
    Warning,
    /// Failure requiring attention
    Error,
    /// Immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Whether retrying the same operation may succeed
    fn is_retryable(&self) -> bool;

    /// Severity level for monitoring and logging
    fn severity(&self) -> ErrorSeverity;

    /// Whether this error indicates a broken invariant
    fn is_critical(&self) -> bool;

    /// Suggested retry delay, if the source provided one
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Errors raised by the building blocks in this crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Invalid settings, rejected at construction
    Config { message: String, field: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field: Some(field) } => {
                write!(f, "Configuration error in field '{field}': {message}")
            }
            Self::Config { message, field: None } => write!(f, "Configuration error: {message}"),
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }
}

impl CommonError {
    /// Create a simple configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Short machine-readable label for structured log fields
    pub fn error_type_name(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error.
    use super::*;

    /// Validates `CommonError::config_field` display formatting.
    ///
    /// Assertions:
    /// - Confirms the rendered message names the offending field.
    #[test]
    fn test_config_field_display() {
        let err = CommonError::config_field("max_size", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Configuration error in field 'max_size': must be greater than zero"
        );
        assert_eq!(err.error_type_name(), "config");
        assert_eq!(CommonError::config("bad").to_string(), "Configuration error: bad");
    }

    #[test]
    fn test_config_errors_are_permanent() {
        let err = CommonError::config("nope");
        assert!(!err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn test_severity_orders_by_urgency() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }
}
