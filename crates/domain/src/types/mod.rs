//! Domain types and models

pub mod stats;
pub mod weather;

pub use stats::{CacheStatsSnapshot, PoolStats, SweepReport};
pub use weather::{
    CityInfo, CurrentConditions, DailyForecast, Source, WeatherLookup, WeatherReport,
};
