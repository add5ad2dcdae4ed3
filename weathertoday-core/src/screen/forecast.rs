use std::sync::Arc;
use tokio::sync::watch;

use crate::{
    WeatherError,
    cache::WeatherCache,
    model::{ForecastDay, Unit},
    provider::WeatherProvider,
};

use super::{CyclePlan, Screen, ScreenState, no_fallback};

/// Seven-day outlook for the location of the last cached snapshot.
///
/// The screen has no location input of its own: it forecasts wherever the
/// home screen last fetched.
#[derive(Debug)]
pub struct ForecastScreen {
    provider: Arc<dyn WeatherProvider>,
    cache: WeatherCache,
    screen: Screen<Vec<ForecastDay>>,
}

impl ForecastScreen {
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: WeatherCache) -> Self {
        Self { provider, cache, screen: Screen::new() }
    }

    pub fn state(&self) -> ScreenState<Vec<ForecastDay>> {
        self.screen.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenState<Vec<ForecastDay>>> {
        self.screen.subscribe()
    }

    pub async fn load(&self) -> Option<Vec<ForecastDay>> {
        self.load_cycle(false).await
    }

    pub async fn refresh(&self) -> Option<Vec<ForecastDay>> {
        self.load_cycle(true).await
    }

    async fn load_cycle(&self, refreshing: bool) -> Option<Vec<ForecastDay>> {
        let unit = self.cache.unit().await;
        self.screen
            .run_cycle(
                CyclePlan::new().refreshing(refreshing),
                self.fetch(unit),
                no_fallback,
            )
            .await
    }

    async fn fetch(&self, unit: Unit) -> Result<Vec<ForecastDay>, WeatherError> {
        let snapshot = self.cache.snapshot().await.ok_or(WeatherError::NoCachedLocation)?;
        self.provider.forecast(snapshot.lat, snapshot.lon, unit).await
    }
}
