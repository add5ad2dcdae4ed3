//! Typed access to the recognized store keys.
//!
//! Every failure here (I/O, corrupt JSON, unparseable values) is logged and
//! reported to the caller as a miss or a no-op.

use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, sync::Arc};
use tracing::{debug, warn};

use crate::{
    model::{Theme, Unit, WeatherSnapshot},
    store::KeyValueStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Unit,
    CurrentWeather,
    /// Reserved: never read, but cleared together with `CurrentWeather`.
    Forecast,
    Theme,
    Notifications,
    Session,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Unit => "unit",
            CacheKey::CurrentWeather => "currentWeather",
            CacheKey::Forecast => "forecast",
            CacheKey::Theme => "theme",
            CacheKey::Notifications => "notifications",
            CacheKey::Session => "session",
        }
    }

    pub const fn all() -> &'static [CacheKey] {
        &[
            CacheKey::Unit,
            CacheKey::CurrentWeather,
            CacheKey::Forecast,
            CacheKey::Theme,
            CacheKey::Notifications,
            CacheKey::Session,
        ]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct WeatherCache {
    store: Arc<dyn KeyValueStore>,
}

impl WeatherCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, key: CacheKey) -> Option<String> {
        match self.store.get(key.as_str()).await {
            Ok(Some(value)) => {
                debug!(%key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(%key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(%key, "Cache read failed, treating as miss: {e}");
                None
            }
        }
    }

    pub async fn put(&self, key: CacheKey, value: impl Into<String>) {
        if let Err(e) = self.store.set(key.as_str(), value.into()).await {
            warn!(%key, "Cache write failed: {e}");
        }
    }

    pub async fn remove(&self, key: CacheKey) {
        if let Err(e) = self.store.remove(key.as_str()).await {
            warn!(%key, "Cache remove failed: {e}");
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let text = self.get(key).await?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, "Cached value does not decode, ignoring it: {e}");
                None
            }
        }
    }

    pub async fn put_json<T: Serialize + ?Sized>(&self, key: CacheKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(text) => self.put(key, text).await,
            Err(e) => warn!(%key, "Failed to serialize value for cache: {e}"),
        }
    }

    /// Stored unit preference, `metric` when absent or unreadable.
    pub async fn unit(&self) -> Unit {
        self.parsed(CacheKey::Unit).await.unwrap_or_default()
    }

    pub async fn set_unit(&self, unit: Unit) {
        self.put(CacheKey::Unit, unit.as_str()).await;
    }

    pub async fn theme(&self) -> Theme {
        self.parsed(CacheKey::Theme).await.unwrap_or_default()
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.put(CacheKey::Theme, theme.as_str()).await;
    }

    pub async fn notifications(&self) -> bool {
        self.parsed(CacheKey::Notifications).await.unwrap_or(false)
    }

    pub async fn set_notifications(&self, enabled: bool) {
        self.put(CacheKey::Notifications, enabled.to_string()).await;
    }

    pub async fn snapshot(&self) -> Option<WeatherSnapshot> {
        self.get_json(CacheKey::CurrentWeather).await
    }

    pub async fn save_snapshot(&self, snapshot: &WeatherSnapshot) {
        self.put_json(CacheKey::CurrentWeather, snapshot).await;
    }

    /// Drops cached weather; preferences and the session are kept.
    pub async fn clear_weather(&self) {
        self.remove(CacheKey::CurrentWeather).await;
        self.remove(CacheKey::Forecast).await;
    }

    async fn parsed<T: std::str::FromStr>(&self, key: CacheKey) -> Option<T> {
        let raw = self.get(key).await?;
        let parsed = raw.parse().ok();
        if parsed.is_none() {
            warn!(%key, value = %raw, "Ignoring unrecognized cached value");
        }
        parsed
    }
}
