//! Error taxonomy shared by the weather client, the cache and the screens.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// The weather service answered with a structured error body.
    #[error("Weather service error: {0}")]
    RemoteService(String),

    #[error("Could not connect to the weather service")]
    Network,

    #[error("Unexpected weather service response: {0}")]
    InvalidResponse(String),

    #[error("No cached location")]
    NoCachedLocation,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

impl WeatherError {
    /// Short banner text for a screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Location permission denied. Please search for a city.".to_string()
            }
            Self::LocationUnavailable(_) => {
                "Could not determine your location. Please search for a city.".to_string()
            }
            Self::RemoteService(msg) => msg.clone(),
            Self::Network => "Could not connect to the weather service.".to_string(),
            Self::InvalidResponse(_) => "The weather service sent an unreadable response.".to_string(),
            Self::NoCachedLocation => {
                "No location set. Please go to the weather tab first.".to_string()
            }
            Self::Storage(_) => "Local storage error".to_string(),
            Self::InvalidEmail(email) => format!("'{email}' is not a valid email address"),
        }
    }

    /// Whether a screen can usefully retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::LocationUnavailable(_))
    }
}

impl From<std::io::Error> for WeatherError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
