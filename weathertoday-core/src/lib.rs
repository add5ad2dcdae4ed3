//! Core library for the `weathertoday` app.
//!
//! This crate defines:
//! - The WeatherAPI.com client and its unit-system normalization
//! - The durable key-value cache holding the last known good snapshot and preferences
//! - Screen controllers driving the load → cache → render → refresh cycle
//! - Configuration, the session context and the scripted chat responder
//!
//! It is used by `weathertoday-cli`, but the controllers are renderer-agnostic:
//! any front end can subscribe to their view state.

pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod screen;
pub mod session;
pub mod settings;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheKey, WeatherCache};
pub use config::Config;
pub use error::WeatherError;
pub use location::{FixedLocation, LocationResolver, NoLocation, Permission};
pub use model::{
    CitySuggestion, Coordinates, ForecastDay, LocationQuery, Theme, Unit, WeatherSnapshot,
};
pub use provider::{WeatherProvider, provider_from_config};
pub use screen::{ForecastScreen, HomeScreen, Phase, ScreenState};
pub use session::{AuthBackend, LocalAuth, SessionContext, SessionState, User};
pub use settings::Settings;
pub use store::{FileStore, KeyValueStore, MemoryStore};
