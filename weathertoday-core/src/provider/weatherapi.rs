use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    WeatherError,
    config::DEFAULT_BASE_URL,
    model::{CitySuggestion, Coordinates, ForecastDay, LocationQuery, Unit, WeatherSnapshot},
    provider::{FORECAST_DAYS, is_searchable},
};

use super::WeatherProvider;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {e}");
                Client::new()
            });

        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// One combined current + forecast payload for `query`.
    async fn fetch_payload(&self, query: &LocationQuery) -> Result<WaForecastResponse, WeatherError> {
        let url = format!("{}/forecast.json", self.base_url);
        let q = query.to_query_string();
        let days = FORECAST_DAYS.to_string();

        debug!(q = %q, "Requesting WeatherAPI forecast payload");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", q.as_str()), ("days", days.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to send request to WeatherAPI.com: {e}");
                WeatherError::Network
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            warn!("Failed to read WeatherAPI response body: {e}");
            WeatherError::Network
        })?;

        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }

        serde_json::from_str::<WaForecastResponse>(&body).map_err(|e| {
            // Some failures arrive with a success status but an error envelope.
            match serde_json::from_str::<WaErrorEnvelope>(&body) {
                Ok(envelope) => WeatherError::RemoteService(envelope.error.message),
                Err(_) => {
                    warn!("Failed to parse WeatherAPI JSON: {e}; body: {}", truncate_body(&body));
                    WeatherError::InvalidResponse(e.to_string())
                }
            }
        })
    }

    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<CitySuggestion>, WeatherError> {
        let url = format!("{}/search.json", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", query)])
            .send()
            .await
            .map_err(|_| WeatherError::Network)?;

        let status = res.status();
        let body = res.text().await.map_err(|_| WeatherError::Network)?;

        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::InvalidResponse(e.to_string()))
    }

    async fn snapshot_for(
        &self,
        query: LocationQuery,
        unit: Unit,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let payload = self.fetch_payload(&query).await?;
        let snapshot = snapshot_from(payload, unit)?;
        info!(location = %snapshot.location, %unit, "Fetched current weather");
        Ok(snapshot)
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current_weather(
        &self,
        lat: f64,
        lon: f64,
        unit: Unit,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.snapshot_for(LocationQuery::Coordinates(Coordinates::new(lat, lon)), unit)
            .await
    }

    async fn weather_by_city(
        &self,
        city: &str,
        unit: Unit,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.snapshot_for(LocationQuery::Place(city.to_string()), unit).await
    }

    async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        unit: Unit,
    ) -> Result<Vec<ForecastDay>, WeatherError> {
        let query = LocationQuery::Coordinates(Coordinates::new(lat, lon));
        let payload = self.fetch_payload(&query).await?;
        let days = forecast_from(payload, unit);
        if days.len() < FORECAST_DAYS {
            warn!(
                returned = days.len(),
                requested = FORECAST_DAYS,
                "WeatherAPI returned a shorter forecast than requested"
            );
        }
        Ok(days)
    }

    async fn search_cities(&self, query: &str) -> Vec<CitySuggestion> {
        if !is_searchable(query) {
            return Vec::new();
        }

        match self.fetch_suggestions(query).await {
            Ok(suggestions) => {
                debug!(query, count = suggestions.len(), "City search");
                suggestions
            }
            Err(e) => {
                warn!(query, "City search failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Turns a non-success response into `RemoteService` when the body carries the
/// service's error envelope, `Network` otherwise.
fn upstream_error(status: StatusCode, body: &str) -> WeatherError {
    match serde_json::from_str::<WaErrorEnvelope>(body) {
        Ok(envelope) => {
            warn!(%status, code = ?envelope.error.code, "WeatherAPI error: {}", envelope.error.message);
            WeatherError::RemoteService(envelope.error.message)
        }
        Err(_) => {
            warn!(%status, "WeatherAPI request failed: {}", truncate_body(body));
            WeatherError::Network
        }
    }
}

pub(crate) fn snapshot_from(
    payload: WaForecastResponse,
    unit: Unit,
) -> Result<WeatherSnapshot, WeatherError> {
    let WaForecastResponse { location, current, forecast } = payload;

    let today = forecast.forecastday.first().ok_or_else(|| {
        WeatherError::InvalidResponse("response contained no forecastday data".to_string())
    })?;

    let current = current.ok_or_else(|| {
        WeatherError::InvalidResponse("response contained no current conditions".to_string())
    })?;

    let (temperature, feels_like, wind_speed, visibility) = match unit {
        Unit::Metric => (current.temp_c, current.feelslike_c, current.wind_kph, current.vis_km),
        Unit::Imperial => (current.temp_f, current.feelslike_f, current.wind_mph, current.vis_miles),
    };

    Ok(WeatherSnapshot {
        location: format!("{}, {}", location.name, location.country),
        temperature,
        feels_like,
        condition: current.condition.text.clone(),
        description: current.condition.text,
        humidity: current.humidity.round().clamp(0.0, 100.0) as u8,
        wind_speed,
        pressure: current.pressure_mb,
        visibility,
        sunrise: today.astro.sunrise.clone(),
        sunset: today.astro.sunset.clone(),
        uv_index: current.uv,
        lat: location.lat,
        lon: location.lon,
        unit,
    })
}

pub(crate) fn forecast_from(payload: WaForecastResponse, unit: Unit) -> Vec<ForecastDay> {
    let mut days: Vec<ForecastDay> = payload
        .forecast
        .forecastday
        .into_iter()
        .map(|fd| {
            let (low, high) = match unit {
                Unit::Metric => (fd.day.mintemp_c, fd.day.maxtemp_c),
                Unit::Imperial => (fd.day.mintemp_f, fd.day.maxtemp_f),
            };
            ForecastDay {
                date: fd.date,
                min_temp: low.min(high),
                max_temp: low.max(high),
                condition: fd.day.condition.text,
                icon: normalize_icon_url(&fd.day.condition.icon),
                unit,
            }
        })
        .collect();

    days.sort_by_key(|d| d.date);
    days.truncate(FORECAST_DAYS);
    days
}

/// WeatherAPI serves icons as protocol-relative paths (`//cdn...`).
pub fn normalize_icon_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains("://") {
        raw.to_string()
    } else if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        format!("https://{}", raw.trim_start_matches('/'))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WaErrorEnvelope {
    error: WaErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaLocation {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaCondition {
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaCurrent {
    temp_c: f64,
    temp_f: f64,
    feelslike_c: f64,
    feelslike_f: f64,
    condition: WaCondition,
    humidity: f64,
    wind_kph: f64,
    wind_mph: f64,
    pressure_mb: f64,
    vis_km: f64,
    vis_miles: f64,
    #[serde(default)]
    uv: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaDay {
    mintemp_c: f64,
    mintemp_f: f64,
    maxtemp_c: f64,
    maxtemp_f: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaAstro {
    sunrise: String,
    sunset: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    astro: WaAstro,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaForecastResponse {
    location: WaLocation,
    current: Option<WaCurrent>,
    forecast: WaForecast,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(days: serde_json::Value) -> WaForecastResponse {
        serde_json::from_value(json!({
            "location": { "name": "Paris", "country": "France", "lat": 48.87, "lon": 2.33 },
            "current": {
                "temp_c": 18.0, "temp_f": 64.4,
                "feelslike_c": 17.1, "feelslike_f": 62.8,
                "condition": { "text": "Light rain", "icon": "//cdn.weatherapi.com/weather/64x64/day/296.png" },
                "humidity": 82,
                "wind_kph": 14.4, "wind_mph": 8.9,
                "pressure_mb": 1012.0,
                "vis_km": 10.0, "vis_miles": 6.0,
                "uv": 3.0
            },
            "forecast": { "forecastday": days }
        }))
        .expect("fixture must decode")
    }

    fn day(date: &str, min_c: f64, max_c: f64) -> serde_json::Value {
        json!({
            "date": date,
            "day": {
                "mintemp_c": min_c, "mintemp_f": min_c * 1.8 + 32.0,
                "maxtemp_c": max_c, "maxtemp_f": max_c * 1.8 + 32.0,
                "condition": { "text": "Sunny", "icon": "//cdn.weatherapi.com/weather/64x64/day/113.png" }
            },
            "astro": { "sunrise": "06:45 AM", "sunset": "08:30 PM" }
        })
    }

    #[test]
    fn metric_snapshot_selects_celsius_fields() {
        let s = snapshot_from(payload(json!([day("2024-06-01", 12.0, 21.0)])), Unit::Metric).unwrap();
        assert_eq!(s.location, "Paris, France");
        assert_eq!(s.temperature, 18.0);
        assert_eq!(s.feels_like, 17.1);
        assert_eq!(s.wind_speed, 14.4);
        assert_eq!(s.visibility, 10.0);
        assert_eq!(s.unit, Unit::Metric);
    }

    #[test]
    fn imperial_snapshot_selects_fahrenheit_fields() {
        let s = snapshot_from(payload(json!([day("2024-06-01", 12.0, 21.0)])), Unit::Imperial).unwrap();
        assert_eq!(s.temperature, 64.4);
        assert_eq!(s.feels_like, 62.8);
        assert_eq!(s.wind_speed, 8.9);
        assert_eq!(s.visibility, 6.0);
        assert_eq!(s.unit, Unit::Imperial);
    }

    #[test]
    fn snapshot_takes_unit_independent_fields_and_astro() {
        let s = snapshot_from(payload(json!([day("2024-06-01", 12.0, 21.0)])), Unit::Imperial).unwrap();
        assert_eq!(s.pressure, 1012.0);
        assert_eq!(s.humidity, 82);
        assert_eq!(s.uv_index, 3.0);
        assert_eq!(s.sunrise, "06:45 AM");
        assert_eq!(s.sunset, "08:30 PM");
        assert_eq!((s.lat, s.lon), (48.87, 2.33));
        assert_eq!(s.condition, "Light rain");
        assert_eq!(s.description, "Light rain");
    }

    #[test]
    fn snapshot_without_forecast_days_is_invalid() {
        let err = snapshot_from(payload(json!([])), Unit::Metric).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidResponse(_)));
    }

    #[test]
    fn forecast_sorts_truncates_and_normalizes() {
        let days: Vec<_> = (1..=9)
            .rev()
            .map(|d| day(&format!("2024-06-{d:02}"), 10.0, 20.0))
            .collect();
        let forecast = forecast_from(payload(json!(days)), Unit::Metric);

        assert_eq!(forecast.len(), FORECAST_DAYS);
        assert_eq!(forecast[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(forecast.windows(2).all(|w| w[0].date < w[1].date));
        assert!(forecast.iter().all(|d| d.icon.starts_with("https://cdn.weatherapi.com/")));
    }

    #[test]
    fn forecast_swaps_inverted_temperatures() {
        let forecast = forecast_from(payload(json!([day("2024-06-01", 25.0, 15.0)])), Unit::Metric);
        assert_eq!(forecast[0].min_temp, 15.0);
        assert_eq!(forecast[0].max_temp, 25.0);
    }

    #[test]
    fn forecast_imperial_uses_fahrenheit() {
        let forecast = forecast_from(payload(json!([day("2024-06-01", 10.0, 20.0)])), Unit::Imperial);
        assert!((forecast[0].min_temp - 50.0).abs() < 1e-9);
        assert!((forecast[0].max_temp - 68.0).abs() < 1e-9);
        assert_eq!(forecast[0].unit, Unit::Imperial);
    }

    #[test]
    fn icon_urls_are_scheme_qualified() {
        assert_eq!(
            normalize_icon_url("//cdn.example.com/icon.png"),
            "https://cdn.example.com/icon.png"
        );
        assert_eq!(
            normalize_icon_url("https://cdn.example.com/icon.png"),
            "https://cdn.example.com/icon.png"
        );
        assert_eq!(
            normalize_icon_url("cdn.example.com/icon.png"),
            "https://cdn.example.com/icon.png"
        );
        assert_eq!(normalize_icon_url(""), "");
    }

    #[test]
    fn structured_error_becomes_remote_service() {
        let body = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;
        let err = upstream_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(err, WeatherError::RemoteService("No matching location found.".into()));
    }

    #[test]
    fn unstructured_error_becomes_network() {
        let err = upstream_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err, WeatherError::Network);
    }

    #[test]
    fn truncate_body_is_char_safe() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
