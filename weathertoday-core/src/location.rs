use async_trait::async_trait;
use std::fmt::Debug;

use crate::{WeatherError, model::Coordinates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Source of device coordinates, gated by a permission grant.
#[async_trait]
pub trait LocationResolver: Send + Sync + Debug {
    async fn request_permission(&self) -> Permission;

    async fn current_position(&self) -> Result<Coordinates, WeatherError>;
}

/// Always grants permission and reports the same coordinates, provided they
/// are finite and within latitude/longitude range.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationResolver for FixedLocation {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        let Coordinates { lat, lon } = self.coords;
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(WeatherError::LocationUnavailable(format!(
                "invalid coordinates {lat},{lon}"
            )));
        }
        Ok(self.coords)
    }
}

/// No location source available; behaves like a denied permission prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationResolver for NoLocation {
    async fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        Err(WeatherError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_location_grants_and_reports() {
        let loc = FixedLocation::new(Coordinates::new(51.5, -0.12));
        assert_eq!(loc.request_permission().await, Permission::Granted);
        assert_eq!(loc.current_position().await.unwrap(), Coordinates::new(51.5, -0.12));
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_unavailable() {
        for coords in [
            Coordinates::new(91.0, 0.0),
            Coordinates::new(0.0, -180.5),
            Coordinates::new(f64::NAN, 0.0),
        ] {
            let err = FixedLocation::new(coords).current_position().await.unwrap_err();
            assert!(matches!(err, WeatherError::LocationUnavailable(_)));
        }
        let edge = FixedLocation::new(Coordinates::new(-90.0, 180.0));
        assert!(edge.current_position().await.is_ok());
    }

    #[tokio::test]
    async fn no_location_denies() {
        assert_eq!(NoLocation.request_permission().await, Permission::Denied);
        assert_eq!(NoLocation.current_position().await, Err(WeatherError::PermissionDenied));
    }
}
