//! Normalized cache keys

use std::fmt;

use nimbus_domain::{NimbusError, Result};

/// A location or city name normalized for cache lookups
///
/// Normalization trims the input, collapses internal whitespace runs to a
/// single space and lowercases (Unicode-aware), so `"  New   York "` and
/// `"new york"` share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// # Errors
    /// Returns `NimbusError::InvalidInput` when `raw` is blank.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if normalized.is_empty() {
            return Err(NimbusError::InvalidInput("location must not be blank".to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
