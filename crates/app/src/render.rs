//! Plain-text rendering of weather reports and cache statistics

use std::fmt::Write;

use nimbus_common::cache::CacheHealthReport;
use nimbus_domain::{PoolStats, WeatherLookup};

/// Render a report, prefixed with where it came from
///
/// ```text
/// [cached] 广州, 广东省
/// 多云 28°C, feels like 31°C
/// ...
/// ```
pub fn render_lookup(lookup: &WeatherLookup) -> String {
    let report = &lookup.report;
    let now = &report.current;
    let mut out = String::new();

    let _ = writeln!(out, "[{}] {}", lookup.source, report.city.display_name());
    let _ = writeln!(out, "{} {}°C, feels like {}°C", now.text, now.temperature, now.feels_like);
    let _ = writeln!(
        out,
        "Humidity {}% | Wind {} {} | Precipitation {}mm | Pressure {}hPa | Visibility {}km",
        now.humidity,
        now.wind_direction,
        now.wind_scale,
        now.precipitation,
        now.pressure,
        now.visibility
    );

    if !report.forecast.is_empty() {
        let _ = writeln!(out, "Forecast:");
        for day in &report.forecast {
            let _ = writeln!(
                out,
                "  {}  {} / {}  {}~{}°C",
                day.date, day.text_day, day.text_night, day.temp_min, day.temp_max
            );
        }
    }

    let observed = if now.observed_at.is_empty() {
        report.fetched_at.to_rfc3339()
    } else {
        now.observed_at.clone()
    };
    let _ = write!(out, "Observed at {observed}");
    out
}

/// Render the statistics footer: counters, then any health findings
pub fn render_stats(stats: &PoolStats, health: &[CacheHealthReport]) -> String {
    let mut out = stats.to_string();
    for report in health.iter().filter(|r| !r.recommendations.is_empty()) {
        let _ = write!(out, "\n{report}");
    }
    out
}
