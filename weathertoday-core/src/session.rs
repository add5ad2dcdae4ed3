//! Signed-in identity shared by every screen.
//!
//! `SessionContext` is the single publisher. Screens subscribe to it and only
//! ever read whether a user is present and their email.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    WeatherError,
    cache::{CacheKey, WeatherCache},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

#[async_trait]
pub trait AuthBackend: Send + Sync + Debug {
    /// The identity persisted by a previous run, if any.
    async fn restore(&self) -> Result<Option<User>, WeatherError>;

    async fn sign_in(&self, email: &str) -> Result<User, WeatherError>;

    async fn sign_out(&self) -> Result<(), WeatherError>;
}

#[derive(Debug)]
pub struct SessionContext {
    backend: Arc<dyn AuthBackend>,
    state: watch::Sender<SessionState>,
}

impl SessionContext {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { backend, state }
    }

    /// Restores the persisted session and ends the initial loading state.
    pub async fn initialize(&self) {
        let user = match self.backend.restore().await {
            Ok(user) => user,
            Err(e) => {
                warn!("Failed to restore session: {e}");
                None
            }
        };
        info!(user = user.as_ref().map(|u| u.email.as_str()).unwrap_or("none"), "Initial session");
        self.publish(user);
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().user.is_some()
    }

    pub fn email(&self) -> Option<String> {
        self.state.borrow().user.as_ref().map(|u| u.email.clone())
    }

    pub async fn sign_in(&self, email: &str) -> Result<User, WeatherError> {
        let user = self.backend.sign_in(email).await?;
        info!(email = %user.email, "Signed in");
        self.publish(Some(user.clone()));
        Ok(user)
    }

    /// The published session is cleared even when the backend fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.backend.sign_out().await {
            warn!("Sign out failed, clearing local session anyway: {e}");
        } else {
            info!("Signed out");
        }
        self.publish(None);
    }

    fn publish(&self, user: Option<User>) {
        self.state.send_replace(SessionState { user, loading: false });
    }
}

/// Identity persisted in the local store under `session`.
#[derive(Debug, Clone)]
pub struct LocalAuth {
    cache: WeatherCache,
}

impl LocalAuth {
    pub fn new(cache: WeatherCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl AuthBackend for LocalAuth {
    async fn restore(&self) -> Result<Option<User>, WeatherError> {
        Ok(self.cache.get_json(CacheKey::Session).await)
    }

    async fn sign_in(&self, email: &str) -> Result<User, WeatherError> {
        let email = normalize_email(email)?;

        if let Some(existing) = self.restore().await?.filter(|u| u.email == email) {
            return Ok(existing);
        }

        let user = User { id: Uuid::new_v4().to_string(), email, avatar_url: None };
        self.cache.put_json(CacheKey::Session, &user).await;
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), WeatherError> {
        self.cache.remove(CacheKey::Session).await;
        Ok(())
    }
}

/// Lowercases and trims; rejects anything without a `local@domain.tld` shape.
pub fn normalize_email(email: &str) -> Result<String, WeatherError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid { Ok(email) } else { Err(WeatherError::InvalidEmail(email)) }
}
