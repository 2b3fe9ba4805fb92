//! Weather query surface over the cache pool

pub mod key;
pub mod ports;
pub mod service;

pub use key::CacheKey;
pub use ports::{CityLookup, WeatherFetcher};
pub use service::WeatherService;
