//! View state shared by the weather screens and the load cycle that drives it.
//!
//! A cycle shows any stale value first, awaits the fetch, optionally runs a
//! fallback when the fetch fails, then publishes the outcome and persists
//! accepted data. Each cycle holds a ticket; once a newer cycle has started,
//! the older one can no longer touch the view or the cache.

use serde::Serialize;
use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    WeatherError,
    cache::{CacheKey, WeatherCache},
};

pub mod forecast;
pub mod home;

pub use forecast::ForecastScreen;
pub use home::HomeScreen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    /// A user-triggered reload; previously displayed data stays visible.
    Refreshing,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenState<T> {
    pub phase: Phase,
    pub data: Option<T>,
    pub error: Option<String>,
    /// The last failure may clear up if the same load is run again.
    pub retryable: bool,
}

impl<T> ScreenState<T> {
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Loading | Phase::Refreshing)
    }
}

impl<T> Default for ScreenState<T> {
    fn default() -> Self {
        Self { phase: Phase::Loading, data: None, error: None, retryable: false }
    }
}

/// Inputs to one load cycle besides the fetch itself.
#[derive(Debug)]
pub struct CyclePlan<'a, T> {
    pub refreshing: bool,
    pub stale: Option<T>,
    pub persist: Option<(&'a WeatherCache, CacheKey)>,
}

impl<'a, T> CyclePlan<'a, T> {
    pub fn new() -> Self {
        Self { refreshing: false, stale: None, persist: None }
    }

    pub fn refreshing(mut self, refreshing: bool) -> Self {
        self.refreshing = refreshing;
        self
    }

    pub fn stale(mut self, stale: Option<T>) -> Self {
        self.stale = stale;
        self
    }

    pub fn persist_to(mut self, cache: &'a WeatherCache, key: CacheKey) -> Self {
        self.persist = Some((cache, key));
        self
    }
}

impl<T> Default for CyclePlan<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback strategy for cycles that have none.
pub fn no_fallback<T>(_err: &WeatherError) -> Option<std::future::Ready<Result<T, WeatherError>>> {
    None
}

#[derive(Debug)]
pub struct Screen<T> {
    state: watch::Sender<ScreenState<T>>,
    latest: AtomicU64,
}

impl<T> Screen<T>
where
    T: Clone + Serialize,
{
    pub fn new() -> Self {
        let (state, _) = watch::channel(ScreenState::default());
        Self { state, latest: AtomicU64::new(0) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenState<T>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ScreenState<T> {
        self.state.borrow().clone()
    }

    /// Runs one load cycle and returns the data it displayed, if any.
    pub async fn run_cycle<F, Fb, FbFut>(
        &self,
        plan: CyclePlan<'_, T>,
        fetch: F,
        fallback: Fb,
    ) -> Option<T>
    where
        F: Future<Output = Result<T, WeatherError>>,
        Fb: FnOnce(&WeatherError) -> Option<FbFut>,
        FbFut: Future<Output = Result<T, WeatherError>>,
    {
        let ticket = self.begin(plan.refreshing);

        if let Some(stale) = plan.stale {
            self.update(ticket, |s| s.data = Some(stale));
        }

        let result = match fetch.await {
            Ok(data) => Ok(data),
            Err(err) => match fallback(&err) {
                Some(fallback_fetch) => {
                    debug!(ticket, "Fetch failed ({err}), running fallback");
                    self.update(ticket, |s| s.error = Some(err.user_message()));
                    fallback_fetch.await
                }
                None => Err(err),
            },
        };

        self.finish(ticket, result, plan.persist).await
    }

    fn begin(&self, refreshing: bool) -> u64 {
        let mut ticket = 0;
        self.state.send_modify(|s| {
            ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            s.phase = if refreshing && s.data.is_some() {
                Phase::Refreshing
            } else {
                Phase::Loading
            };
            s.error = None;
            s.retryable = false;
        });
        ticket
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Applies `f` only while `ticket` is still the newest cycle.
    fn update(&self, ticket: u64, f: impl FnOnce(&mut ScreenState<T>)) -> bool {
        self.state.send_if_modified(|s| {
            if !self.is_current(ticket) {
                return false;
            }
            f(s);
            true
        })
    }

    async fn finish(
        &self,
        ticket: u64,
        result: Result<T, WeatherError>,
        persist: Option<(&WeatherCache, CacheKey)>,
    ) -> Option<T> {
        match result {
            Ok(data) => {
                let shown = data.clone();
                let accepted = self.update(ticket, |s| {
                    s.phase = Phase::Ready;
                    s.error = None;
                    s.data = Some(shown);
                });
                if !accepted {
                    debug!(ticket, "Discarding result of a superseded load cycle");
                    return None;
                }
                if let Some((cache, key)) = persist {
                    cache.put_json(key, &data).await;
                }
                Some(data)
            }
            Err(err) => {
                warn!(ticket, "Load cycle failed: {err}");
                let message = err.user_message();
                let retryable = err.is_retryable();
                if !self.update(ticket, |s| {
                    s.phase = Phase::Error;
                    s.error = Some(message);
                    s.retryable = retryable;
                }) {
                    debug!(ticket, "Discarding error of a superseded load cycle");
                }
                None
            }
        }
    }
}

impl<T> Default for Screen<T>
where
    T: Clone + Serialize,
{
    fn default() -> Self {
        Self::new()
    }
}
