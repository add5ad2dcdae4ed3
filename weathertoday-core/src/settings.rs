use crate::{
    cache::WeatherCache,
    model::{Theme, Unit},
};

/// User preferences as stored in the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub unit: Unit,
    pub theme: Theme,
    pub notifications: bool,
}

impl Settings {
    pub async fn load(cache: &WeatherCache) -> Self {
        Self {
            unit: cache.unit().await,
            theme: cache.theme().await,
            notifications: cache.notifications().await,
        }
    }

    pub async fn set_unit(&mut self, cache: &WeatherCache, unit: Unit) {
        self.unit = unit;
        cache.set_unit(unit).await;
    }

    pub async fn set_theme(&mut self, cache: &WeatherCache, theme: Theme) {
        self.theme = theme;
        cache.set_theme(theme).await;
    }

    pub async fn set_notifications(&mut self, cache: &WeatherCache, enabled: bool) {
        self.notifications = enabled;
        cache.set_notifications(enabled).await;
    }

    /// Removes cached weather so the next home load starts from scratch.
    pub async fn clear_cache(cache: &WeatherCache) {
        cache.clear_weather().await;
    }
}
