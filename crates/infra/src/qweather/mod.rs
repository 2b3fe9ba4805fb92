//! QWeather provider adapter

pub mod client;
mod dto;

pub use client::QWeatherClient;
