//! QWeather response payloads
//!
//! Only the fields the domain uses are declared; everything else in the
//! provider's JSON is ignored. Numeric values arrive as strings.

use nimbus_domain::{CityInfo, CurrentConditions, DailyForecast};
use serde::Deserialize;

/// `GET /geo/v2/city/lookup`
#[derive(Debug, Deserialize)]
pub(crate) struct CityLookupResponse {
    pub code: String,
    #[serde(default)]
    pub location: Vec<LocationDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LocationDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub adm1: String,
    #[serde(default)]
    pub adm2: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lon: String,
    #[serde(default)]
    pub fx_link: String,
}

impl From<LocationDto> for CityInfo {
    fn from(dto: LocationDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            adm1: dto.adm1,
            adm2: dto.adm2,
            country: dto.country,
            lat: dto.lat,
            lon: dto.lon,
            fx_link: dto.fx_link,
        }
    }
}

/// `GET /v7/weather/now`
#[derive(Debug, Deserialize)]
pub(crate) struct NowResponse {
    pub code: String,
    pub now: Option<NowDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct NowDto {
    pub obs_time: String,
    pub temp: String,
    pub feels_like: String,
    pub text: String,
    pub wind_dir: String,
    pub wind_scale: String,
    pub humidity: String,
    pub precip: String,
    pub pressure: String,
    pub vis: String,
}

impl From<NowDto> for CurrentConditions {
    fn from(dto: NowDto) -> Self {
        Self {
            observed_at: dto.obs_time,
            text: dto.text,
            temperature: dto.temp,
            feels_like: dto.feels_like,
            humidity: dto.humidity,
            wind_direction: dto.wind_dir,
            wind_scale: dto.wind_scale,
            precipitation: dto.precip,
            pressure: dto.pressure,
            visibility: dto.vis,
        }
    }
}

/// `GET /v7/weather/7d`
#[derive(Debug, Deserialize)]
pub(crate) struct DailyResponse {
    pub code: String,
    #[serde(default)]
    pub daily: Vec<DailyDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DailyDto {
    pub fx_date: String,
    pub text_day: String,
    pub text_night: String,
    pub temp_max: String,
    pub temp_min: String,
}

impl From<DailyDto> for DailyForecast {
    fn from(dto: DailyDto) -> Self {
        Self {
            date: dto.fx_date,
            text_day: dto.text_day,
            text_night: dto.text_night,
            temp_max: dto.temp_max,
            temp_min: dto.temp_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_lookup_maps_camel_case_fields() {
        let body = r#"{
            "code": "200",
            "location": [{
                "name": "广州", "id": "101280101", "lat": "23.12", "lon": "113.28",
                "adm2": "广州", "adm1": "广东省", "country": "中国",
                "tz": "Asia/Shanghai", "fxLink": "https://www.qweather.com/weather/guangzhou-101280101.html"
            }]
        }"#;

        let response: CityLookupResponse = serde_json::from_str(body).unwrap();
        let city: CityInfo = response.location.into_iter().next().unwrap().into();

        assert_eq!(city.id, "101280101");
        assert_eq!(city.adm1, "广东省");
        assert!(city.fx_link.ends_with("101280101.html"));
    }

    #[test]
    fn empty_lookup_has_no_locations() {
        let response: CityLookupResponse = serde_json::from_str(r#"{"code":"404"}"#).unwrap();
        assert!(response.location.is_empty());
    }

    #[test]
    fn now_tolerates_missing_fields() {
        let body = r#"{"code":"200","now":{"obsTime":"2024-05-01T10:00+08:00","temp":"26","text":"多云"}}"#;
        let response: NowResponse = serde_json::from_str(body).unwrap();
        let current: CurrentConditions = response.now.unwrap().into();

        assert_eq!(current.temperature, "26");
        assert_eq!(current.text, "多云");
        assert!(current.humidity.is_empty());
    }
}
