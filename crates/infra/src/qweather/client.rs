//! QWeather HTTP adapter
//!
//! Implements both provider ports against the QWeather REST API:
//! - `GET /geo/v2/city/lookup` resolves a name to a city (first match wins)
//! - `GET /v7/weather/now` and `GET /v7/weather/7d` make up a report
//!
//! QWeather reports failures both as HTTP statuses and as a `code` field in
//! an HTTP 200 body; both are mapped through the same status table.

use async_trait::async_trait;
use chrono::Utc;
use nimbus_core::{CityLookup, WeatherFetcher};
use nimbus_domain::constants::MAX_FORECAST_DAYS;
use nimbus_domain::{CityInfo, NimbusError, ProviderConfig, Result, WeatherReport};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::dto::{CityLookupResponse, DailyResponse, NowResponse};
use crate::errors::conversions::status_to_error;
use crate::errors::InfraError;
use crate::http::HttpClient;

const CITY_LOOKUP_PATH: &str = "/geo/v2/city/lookup";
const WEATHER_NOW_PATH: &str = "/v7/weather/now";
const WEATHER_DAILY_PATH: &str = "/v7/weather/7d";
const SUCCESS_CODE: &str = "200";

/// QWeather client implementing [`CityLookup`] and [`WeatherFetcher`]
#[derive(Debug, Clone)]
pub struct QWeatherClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    lang: String,
}

impl QWeatherClient {
    /// Build a client from provider configuration
    ///
    /// `api_host` may be a bare host (HTTPS is assumed) or a full URL.
    ///
    /// # Errors
    /// Returns `NimbusError::Config` for an invalid provider config, or
    /// `NimbusError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let http = HttpClient::builder()
            .timeout(config.timeout())
            .max_attempts(config.max_attempts)
            .user_agent(concat!("nimbus/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_http(http, config))
    }

    /// Build a client over an existing [`HttpClient`]
    pub fn with_http(http: HttpClient, config: &ProviderConfig) -> Self {
        Self {
            http,
            base_url: base_url(&config.api_host),
            api_key: config.api_key.clone(),
            lang: config.lang.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        location: &str,
        context: &str,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let query =
            [("location", location), ("key", self.api_key.as_str()), ("lang", self.lang.as_str())];

        let response = self.http.get(&url, &query).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_to_error(status.as_u16(), context));
        }

        response.json::<T>().await.map_err(|err| NimbusError::from(InfraError::from(err)))
    }
}

#[async_trait]
impl CityLookup for QWeatherClient {
    #[instrument(skip(self))]
    async fn lookup_city(&self, name: &str) -> Result<CityInfo> {
        let context = format!("city lookup for '{name}'");
        let response: CityLookupResponse =
            self.get_json(CITY_LOOKUP_PATH, name, &context).await?;
        check_code(&response.code, &context)?;

        let city = response
            .location
            .into_iter()
            .next()
            .map(CityInfo::from)
            .ok_or_else(|| NimbusError::NotFound(format!("no city matches '{name}'")))?;

        debug!(id = %city.id, city = %city.display_name(), "City resolved");
        Ok(city)
    }
}

#[async_trait]
impl WeatherFetcher for QWeatherClient {
    #[instrument(skip(self, city), fields(city_id = %city.id))]
    async fn fetch_weather(&self, city: &CityInfo) -> Result<WeatherReport> {
        let now_context = format!("current weather for {}", city.name);
        let daily_context = format!("forecast for {}", city.name);

        let (now, daily) = tokio::try_join!(
            self.get_json::<NowResponse>(WEATHER_NOW_PATH, &city.id, &now_context),
            self.get_json::<DailyResponse>(WEATHER_DAILY_PATH, &city.id, &daily_context),
        )?;
        check_code(&now.code, &now_context)?;
        check_code(&daily.code, &daily_context)?;

        let current = now.now.ok_or_else(|| {
            NimbusError::Network(format!("{now_context}: response has no `now` block"))
        })?;

        Ok(WeatherReport {
            city: city.clone(),
            current: current.into(),
            forecast: daily.daily.into_iter().take(MAX_FORECAST_DAYS).map(Into::into).collect(),
            fetched_at: Utc::now(),
        })
    }
}

fn check_code(code: &str, context: &str) -> Result<()> {
    if code == SUCCESS_CODE {
        return Ok(());
    }
    let numeric = code.parse::<u16>().unwrap_or(500);
    Err(status_to_error(numeric, context))
}

fn base_url(api_host: &str) -> String {
    let host = api_host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
