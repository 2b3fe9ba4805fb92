//! Conversions from external infrastructure errors into domain errors.

use nimbus_common::error::{ErrorClassification, ErrorSeverity};
use nimbus_domain::NimbusError;
use reqwest::Error as HttpError;
use reqwest::StatusCode;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub NimbusError);

impl From<InfraError> for NimbusError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<NimbusError> for InfraError {
    fn from(value: NimbusError) -> Self {
        InfraError(value)
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for InfraError {}

impl ErrorClassification for InfraError {
    fn is_retryable(&self) -> bool {
        matches!(self.0, NimbusError::Network(_) | NimbusError::Timeout(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match &self.0 {
            NimbusError::Config(_) => ErrorSeverity::Critical,
            NimbusError::Internal(_) => ErrorSeverity::Error,
            NimbusError::Network(_) | NimbusError::RateLimited(_) | NimbusError::Timeout(_) => {
                ErrorSeverity::Warning
            }
            NimbusError::NotFound(_) | NimbusError::InvalidInput(_) => ErrorSeverity::Info,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self.0, NimbusError::Config(_))
    }
}

/// Map a provider status code to the domain error it represents
///
/// Shared by HTTP status handling and QWeather's in-body `code` field, which
/// reuses HTTP-style numbers.
pub(crate) fn status_to_error(code: u16, context: &str) -> NimbusError {
    let reason = StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("unknown status");
    let message = format!("{context}: provider returned {code} {reason}");

    match code {
        204 | 404 => NimbusError::NotFound(message),
        402 | 429 => NimbusError::RateLimited(message),
        401 | 403 => NimbusError::Config(message),
        400 => NimbusError::InvalidInput(message),
        _ => NimbusError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → NimbusError */
/* -------------------------------------------------------------------------- */

trait IntoNimbusError {
    fn into_nimbus(self) -> NimbusError;
}

impl IntoNimbusError for HttpError {
    fn into_nimbus(self) -> NimbusError {
        if self.is_timeout() {
            return NimbusError::Timeout("HTTP request timed out".into());
        }

        if self.is_connect() {
            return NimbusError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_to_error(status.as_u16(), "HTTP request failed");
        }

        if self.is_decode() {
            return NimbusError::Network(format!("malformed provider response: {self}"));
        }

        NimbusError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_nimbus())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
