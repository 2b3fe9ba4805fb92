//! Weather and city data returned by the provider

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    /// Provider location id, used for weather requests
    pub id: String,
    pub name: String,
    /// First-level administrative area (province)
    #[serde(default)]
    pub adm1: String,
    /// Second-level administrative area (city)
    #[serde(default)]
    pub adm2: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lon: String,
    /// Link to the provider's forecast page
    #[serde(default)]
    pub fx_link: String,
}

impl CityInfo {
    /// "name, adm2, adm1" with duplicates and blanks dropped
    pub fn display_name(&self) -> String {
        let mut parts: Vec<&str> = vec![self.name.as_str()];
        for part in [self.adm2.as_str(), self.adm1.as_str()] {
            if !part.is_empty() && !parts.contains(&part) {
                parts.push(part);
            }
        }
        parts.join(", ")
    }
}

/// Current observed conditions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Observation time as reported by the provider
    pub observed_at: String,
    /// Condition text, e.g. "晴"
    pub text: String,
    /// Degrees Celsius
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind_direction: String,
    pub wind_scale: String,
    pub precipitation: String,
    pub pressure: String,
    pub visibility: String,
}

/// One forecast day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// `YYYY-MM-DD`
    pub date: String,
    pub text_day: String,
    pub text_night: String,
    pub temp_max: String,
    pub temp_min: String,
}

/// A full weather report for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: CityInfo,
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
    /// When the report was fetched from upstream
    pub fetched_at: DateTime<Utc>,
}

/// Where a value handed to a caller came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Served from a valid cache entry
    Cached,
    /// Produced by an upstream fetch during this call
    Live,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to a weather query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherLookup {
    pub report: WeatherReport,
    pub source: Source,
}
