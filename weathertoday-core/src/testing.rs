//! In-process provider double for controller tests.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::{
    WeatherError,
    model::{CitySuggestion, ForecastDay, Unit, WeatherSnapshot},
    provider::{FORECAST_DAYS, WeatherProvider, is_searchable},
};

#[derive(Debug, Default)]
pub(crate) struct FakeProvider {
    failure: Option<WeatherError>,
    coordinate_calls: Mutex<Vec<(f64, f64, Unit)>>,
    city_calls: Mutex<Vec<(String, Unit)>>,
    forecast_calls: Mutex<Vec<(f64, f64, Unit)>>,
    search_calls: Mutex<Vec<String>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every weather call fails with `err`; search still answers.
    pub(crate) fn failing(mut self, err: WeatherError) -> Self {
        self.failure = Some(err);
        self
    }

    /// The next coordinate lookup waits until `gate` fires or is dropped.
    pub(crate) fn gated(self, gate: oneshot::Receiver<()>) -> Self {
        *self.gate.lock().unwrap() = Some(gate);
        self
    }

    pub(crate) fn coordinate_calls(&self) -> Vec<(f64, f64, Unit)> {
        self.coordinate_calls.lock().unwrap().clone()
    }

    pub(crate) fn city_calls(&self) -> Vec<(String, Unit)> {
        self.city_calls.lock().unwrap().clone()
    }

    pub(crate) fn forecast_calls(&self) -> Vec<(f64, f64, Unit)> {
        self.forecast_calls.lock().unwrap().clone()
    }

    pub(crate) fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), WeatherError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn snapshot(location: String, lat: f64, lon: f64, unit: Unit) -> WeatherSnapshot {
        let (temperature, wind_speed) = match unit {
            Unit::Metric => (20.0, 10.0),
            Unit::Imperial => (68.0, 6.2),
        };
        WeatherSnapshot {
            location,
            temperature,
            feels_like: temperature,
            condition: "Clear".into(),
            description: "Clear".into(),
            humidity: 50,
            wind_speed,
            pressure: 1013.0,
            visibility: 10.0,
            sunrise: "06:00 AM".into(),
            sunset: "08:00 PM".into(),
            uv_index: 4.0,
            lat,
            lon,
            unit,
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn current_weather(
        &self,
        lat: f64,
        lon: f64,
        unit: Unit,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.coordinate_calls.lock().unwrap().push((lat, lon, unit));
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.check()?;
        Ok(Self::snapshot("Here, Testland".into(), lat, lon, unit))
    }

    async fn weather_by_city(
        &self,
        city: &str,
        unit: Unit,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.city_calls.lock().unwrap().push((city.to_string(), unit));
        self.check()?;
        Ok(Self::snapshot(format!("{city}, Testland"), 40.7, -74.0, unit))
    }

    async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        unit: Unit,
    ) -> Result<Vec<ForecastDay>, WeatherError> {
        self.forecast_calls.lock().unwrap().push((lat, lon, unit));
        self.check()?;
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap_or_default();
        Ok((0..FORECAST_DAYS as u64)
            .map(|i| ForecastDay {
                date: start.checked_add_days(Days::new(i)).unwrap_or(start),
                min_temp: 10.0 + i as f64,
                max_temp: 18.0 + i as f64,
                condition: "Sunny".into(),
                icon: "https://cdn.weatherapi.com/weather/64x64/day/113.png".into(),
                unit,
            })
            .collect())
    }

    async fn search_cities(&self, query: &str) -> Vec<CitySuggestion> {
        if !is_searchable(query) {
            return Vec::new();
        }
        self.search_calls.lock().unwrap().push(query.to_string());
        vec![CitySuggestion {
            id: Some(1),
            name: query.to_string(),
            region: None,
            country: "Testland".into(),
            lat: Some(1.0),
            lon: Some(2.0),
        }]
    }
}
