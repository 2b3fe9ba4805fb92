//! Shared test helpers for `nimbus-core` integration tests.
//!
//! `FakeProvider` implements both provider ports in memory. It counts calls,
//! can hold weather fetches behind a gate so tests can line up concurrent
//! callers, and can be told to fail for specific cities.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use nimbus_common::time::MockClock;
use nimbus_core::{CachePool, CityLookup, WeatherFetcher};
use nimbus_domain::{
    CachePoolConfig, CityInfo, CurrentConditions, NimbusError, Result as DomainResult,
    WeatherReport,
};
use tokio::sync::Notify;

/// In-memory provider for both `CityLookup` and `WeatherFetcher`.
#[derive(Default, Clone)]
pub struct FakeProvider {
    city_calls: Arc<AtomicUsize>,
    weather_calls: Arc<AtomicUsize>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
    weather_failures: Arc<Mutex<HashMap<String, NimbusError>>>,
    unknown_cities: Arc<Mutex<HashSet<String>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every weather fetch until the returned `Notify` is signalled.
    pub fn gate_weather(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&notify));
        notify
    }

    /// Make weather fetches for `city` fail with `error` until cleared.
    pub fn fail_weather(&self, city: &str, error: NimbusError) {
        self.weather_failures.lock().unwrap().insert(city.to_string(), error);
    }

    pub fn recover_weather(&self, city: &str) {
        self.weather_failures.lock().unwrap().remove(city);
    }

    /// Make city lookups for `name` return `NotFound`.
    pub fn unknown_city(&self, name: &str) {
        self.unknown_cities.lock().unwrap().insert(name.to_string());
    }

    pub fn city_calls(&self) -> usize {
        self.city_calls.load(Ordering::SeqCst)
    }

    pub fn weather_calls(&self) -> usize {
        self.weather_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CityLookup for FakeProvider {
    async fn lookup_city(&self, name: &str) -> DomainResult<CityInfo> {
        self.city_calls.fetch_add(1, Ordering::SeqCst);
        if self.unknown_cities.lock().unwrap().contains(name) {
            return Err(NimbusError::NotFound(format!("no city matches '{name}'")));
        }
        Ok(city(name))
    }
}

#[async_trait]
impl WeatherFetcher for FakeProvider {
    async fn fetch_weather(&self, city: &CityInfo) -> DomainResult<WeatherReport> {
        let call = self.weather_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.weather_failures.lock().unwrap().get(&city.name) {
            return Err(error.clone());
        }
        Ok(report(city, call))
    }
}

/// City fixture whose id is derived from the name.
pub fn city(name: &str) -> CityInfo {
    CityInfo {
        id: format!("id-{name}"),
        name: name.to_string(),
        adm1: "广东".to_string(),
        adm2: name.to_string(),
        country: "中国".to_string(),
        lat: "23.1".to_string(),
        lon: "113.2".to_string(),
        fx_link: String::new(),
    }
}

/// Report fixture; `version` lands in the temperature so refreshes are visible.
pub fn report(city: &CityInfo, version: usize) -> WeatherReport {
    WeatherReport {
        city: city.clone(),
        current: CurrentConditions {
            text: "晴".to_string(),
            temperature: version.to_string(),
            ..CurrentConditions::default()
        },
        forecast: Vec::new(),
        fetched_at: Utc::now(),
    }
}

pub fn config(max_cache_size: usize) -> CachePoolConfig {
    CachePoolConfig {
        weather_cache_ttl: 3600,
        city_cache_ttl: 86_400,
        max_cache_size,
        fetch_timeout: 5,
        ..CachePoolConfig::default()
    }
}

/// Pool over `provider` with a controllable clock.
pub fn pool(
    config: CachePoolConfig,
    provider: &FakeProvider,
) -> (Arc<CachePool<MockClock>>, MockClock) {
    let clock = MockClock::new();
    let pool = CachePool::with_clock(
        config,
        Arc::new(provider.clone()),
        Arc::new(provider.clone()),
        clock.clone(),
    )
    .unwrap();
    (Arc::new(pool), clock)
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
