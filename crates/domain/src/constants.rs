//! Application constants
//!
//! Centralized defaults for cache and provider configuration. Durations are
//! in seconds.

// Cache pool defaults
pub const DEFAULT_WEATHER_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_CITY_CACHE_TTL_SECS: u64 = 86_400;
pub const DEFAULT_MAX_CACHE_SIZE: usize = 50;
pub const DEFAULT_ENABLE_ASYNC_REFRESH: bool = true;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 1800;
pub const DEFAULT_ENABLE_STATS: bool = true;

// Refresh-ahead: refresh once this fraction of the TTL has elapsed
pub const DEFAULT_REFRESH_THRESHOLD: f64 = 0.8;
pub const DEFAULT_REFRESH_SCAN_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

// Provider defaults
pub const DEFAULT_API_HOST: &str = "devapi.qweather.com";
pub const DEFAULT_LOCATION: &str = "广州";
pub const DEFAULT_LANG: &str = "zh";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROVIDER_MAX_ATTEMPTS: u32 = 3;

// Forecast days kept in a report
pub const MAX_FORECAST_DAYS: usize = 7;

// Cache names used in stats and logs
pub const WEATHER_CACHE_NAME: &str = "weather_cache";
pub const CITY_CACHE_NAME: &str = "city_cache";
