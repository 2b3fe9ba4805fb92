//! Provider ports
//!
//! The pool never talks to the network itself; adapters in `nimbus-infra`
//! implement these traits.
//!
//! # Example
//!
//! ```no_run
//! use nimbus_core::CityLookup;
//!
//! async fn city_id(lookup: &impl CityLookup) -> Option<String> {
//!     lookup.lookup_city("广州").await.ok().map(|city| city.id)
//! }
//! ```

use async_trait::async_trait;
use nimbus_domain::{CityInfo, Result, WeatherReport};

/// Resolves a free-form location name to a city
#[async_trait]
pub trait CityLookup: Send + Sync {
    /// Resolve `name` to the provider's best match.
    ///
    /// # Errors
    /// - `NimbusError::NotFound` when the provider has no match
    /// - `NimbusError::Network` / `RateLimited` / `Timeout` on fetch failure
    async fn lookup_city(&self, name: &str) -> Result<CityInfo>;
}

/// Fetches the weather report for a resolved city
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    /// # Errors
    /// Same classification as [`CityLookup::lookup_city`].
    async fn fetch_weather(&self, city: &CityInfo) -> Result<WeatherReport>;
}
