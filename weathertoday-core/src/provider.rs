use crate::{
    Config, WeatherError,
    model::{CitySuggestion, ForecastDay, Unit, WeatherSnapshot},
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod weatherapi;

/// Number of forecast days requested upstream.
pub const FORECAST_DAYS: usize = 7;

/// Autocomplete queries shorter than this never leave the process.
pub const MIN_SEARCH_CHARS: usize = 3;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        lat: f64,
        lon: f64,
        unit: Unit,
    ) -> Result<WeatherSnapshot, WeatherError>;

    /// The service geocodes `city` itself; an unknown name is a `RemoteService` error.
    async fn weather_by_city(&self, city: &str, unit: Unit)
    -> Result<WeatherSnapshot, WeatherError>;

    /// Up to [`FORECAST_DAYS`] days, ascending by date, starting today.
    async fn forecast(&self, lat: f64, lon: f64, unit: Unit)
    -> Result<Vec<ForecastDay>, WeatherError>;

    /// Never fails: errors and short queries yield an empty list.
    async fn search_cities(&self, query: &str) -> Vec<CitySuggestion>;
}

/// Whether `query` is long enough to be sent to the autocomplete endpoint.
pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_SEARCH_CHARS
}

/// Construct the WeatherAPI.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;
    let provider = WeatherApiProvider::with_base_url(api_key.to_owned(), config.base_url.clone());
    Ok(Arc::new(provider))
}
