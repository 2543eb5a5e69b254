use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::{
    geocode::{Geocoder, resolve_reverse},
    model::{AppState, Coordinates, LocationStatus, UnavailableReason},
};

pub mod ipapi;

pub use ipapi::IpApiLocator;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("location lookup is not supported")]
    Unsupported,

    #[error("location lookup was denied: {0}")]
    Denied(String),
}

impl LocateError {
    pub fn reason(&self) -> UnavailableReason {
        match self {
            LocateError::Unsupported => UnavailableReason::Unsupported,
            LocateError::Denied(_) => UnavailableReason::Denied,
        }
    }
}

/// A single attempt at finding where the user is.
#[async_trait]
pub trait Locator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LocateError>;
}

/// Coordinates given up front, e.g. on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator(pub Coordinates);

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, LocateError> {
        Ok(self.0)
    }
}

/// Used when automatic location is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLocator;

#[async_trait]
impl Locator for DisabledLocator {
    async fn locate(&self) -> Result<Coordinates, LocateError> {
        Err(LocateError::Unsupported)
    }
}

/// Apply the result of a location attempt to the state.
pub async fn apply_location(
    state: AppState,
    geocoder: &dyn Geocoder,
    located: Result<Coordinates, LocateError>,
) -> AppState {
    match located {
        Ok(coordinates) => resolve_reverse(state, geocoder, coordinates).await,
        Err(err) => {
            tracing::warn!("Geolocation error: {err}");
            state.with_status(LocationStatus::Unavailable(err.reason()))
        }
    }
}

/// Locate once, then reverse-geocode. No retry.
pub async fn acquire(
    state: AppState,
    locator: &dyn Locator,
    geocoder: &dyn Geocoder,
) -> AppState {
    let located = locator.locate().await;
    apply_location(state, geocoder, located).await
}
