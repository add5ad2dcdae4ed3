use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    WeatherError,
    cache::{CacheKey, WeatherCache},
    config::DEFAULT_CITY,
    location::{LocationResolver, Permission},
    model::{CitySuggestion, Unit, WeatherSnapshot},
    provider::{WeatherProvider, is_searchable},
};

use super::{CyclePlan, Screen, ScreenState, no_fallback};

/// Current conditions for the device location or a searched city.
#[derive(Debug)]
pub struct HomeScreen {
    provider: Arc<dyn WeatherProvider>,
    location: Arc<dyn LocationResolver>,
    cache: WeatherCache,
    default_city: String,
    screen: Screen<WeatherSnapshot>,
    suggestions: watch::Sender<Vec<CitySuggestion>>,
}

impl HomeScreen {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        location: Arc<dyn LocationResolver>,
        cache: WeatherCache,
    ) -> Self {
        let (suggestions, _) = watch::channel(Vec::new());
        Self {
            provider,
            location,
            cache,
            default_city: DEFAULT_CITY.to_string(),
            screen: Screen::new(),
            suggestions,
        }
    }

    /// City fetched when location permission is denied.
    pub fn with_default_city(mut self, city: impl Into<String>) -> Self {
        self.default_city = city.into();
        self
    }

    pub fn state(&self) -> ScreenState<WeatherSnapshot> {
        self.screen.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenState<WeatherSnapshot>> {
        self.screen.subscribe()
    }

    pub fn suggestions(&self) -> Vec<CitySuggestion> {
        self.suggestions.borrow().clone()
    }

    pub async fn load(&self) -> Option<WeatherSnapshot> {
        self.load_cycle(false).await
    }

    /// Pull-to-refresh: the full load cycle, keeping current data visible.
    pub async fn refresh(&self) -> Option<WeatherSnapshot> {
        self.load_cycle(true).await
    }

    async fn load_cycle(&self, refreshing: bool) -> Option<WeatherSnapshot> {
        let unit = self.cache.unit().await;
        let stale = self.cache.snapshot().await;
        if stale.is_some() {
            debug!("Showing cached weather while fetching");
        }

        let plan = CyclePlan::new()
            .refreshing(refreshing)
            .stale(stale)
            .persist_to(&self.cache, CacheKey::CurrentWeather);

        self.screen
            .run_cycle(plan, self.fetch_for_device(unit), |err: &WeatherError| {
                matches!(err, WeatherError::PermissionDenied).then(|| {
                    info!(city = %self.default_city, "Location denied, falling back to default city");
                    self.provider.weather_by_city(&self.default_city, unit)
                })
            })
            .await
    }

    async fn fetch_for_device(&self, unit: Unit) -> Result<WeatherSnapshot, WeatherError> {
        if self.location.request_permission().await == Permission::Denied {
            return Err(WeatherError::PermissionDenied);
        }
        let coords = self.location.current_position().await?;
        self.provider.current_weather(coords.lat, coords.lon, unit).await
    }

    /// Autocomplete for the search box. Short input clears the list without a lookup.
    pub async fn search(&self, text: &str) -> Vec<CitySuggestion> {
        let found = if is_searchable(text) {
            self.provider.search_cities(text).await
        } else {
            Vec::new()
        };
        self.suggestions.send_replace(found.clone());
        found
    }

    pub fn clear_suggestions(&self) {
        self.suggestions.send_replace(Vec::new());
    }

    pub async fn select_suggestion(&self, suggestion: &CitySuggestion) -> Option<WeatherSnapshot> {
        self.clear_suggestions();
        self.show_city(&suggestion.name).await
    }

    /// Fetches a typed city name; blank input does nothing.
    pub async fn show_city(&self, city: &str) -> Option<WeatherSnapshot> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }

        let unit = self.cache.unit().await;
        let plan = CyclePlan::new().persist_to(&self.cache, CacheKey::CurrentWeather);
        self.screen
            .run_cycle(plan, self.provider.weather_by_city(city, unit), no_fallback)
            .await
    }
}
