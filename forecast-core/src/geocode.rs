use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::{AppState, Coordinates, LocationStatus};

pub mod nominatim;

pub use nominatim::NominatimGeocoder;

pub const NOT_FOUND_MESSAGE: &str = "Address not found. Please refine the input.";
pub const UNAVAILABLE_MESSAGE: &str =
    "Geocoding currently unavailable; please enter address manually.";

/// A forward-geocoding candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub coordinates: Coordinates,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Coordinates to a human-readable address.
    async fn reverse(&self, coordinates: Coordinates) -> anyhow::Result<String>;

    /// Free-text query to candidate places, best match first.
    async fn search(&self, query: &str) -> anyhow::Result<Vec<Place>>;
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Address not found. Please refine the input.")]
    NotFound,

    #[error("Geocoding currently unavailable; please enter address manually. ({0})")]
    Unavailable(String),
}

impl GeocodeError {
    /// The message shown to the user, without diagnostic detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            GeocodeError::NotFound => NOT_FOUND_MESSAGE,
            GeocodeError::Unavailable(_) => UNAVAILABLE_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForwardOutcome {
    /// Query was blank after trimming; nothing happened.
    Skipped,
    Updated(AppState),
}

pub fn approximate_address(coordinates: Coordinates) -> String {
    format!("Approx Address for {coordinates}")
}

/// Store `coordinates` and resolve them to an address.
///
/// Never fails: a failed or malformed lookup leaves a synthesized address
/// and marks the location as approximate.
pub async fn resolve_reverse(
    state: AppState,
    geocoder: &dyn Geocoder,
    coordinates: Coordinates,
) -> AppState {
    let state = state.with_coordinates(coordinates);

    match geocoder.reverse(coordinates).await {
        Ok(address) => state.with_address(address, LocationStatus::Resolved),
        Err(err) => {
            tracing::warn!("Reverse geocode for {coordinates} failed: {err:#}");
            state.with_address(approximate_address(coordinates), LocationStatus::Approximate)
        }
    }
}

/// Resolve a typed address. On error the caller keeps its current state.
pub async fn resolve_forward(
    state: &AppState,
    geocoder: &dyn Geocoder,
    query: &str,
) -> Result<ForwardOutcome, GeocodeError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(ForwardOutcome::Skipped);
    }

    let places = geocoder.search(query).await.map_err(|err| {
        tracing::warn!("Forward geocode for '{query}' failed: {err:#}");
        GeocodeError::Unavailable(format!("{err:#}"))
    })?;

    let best = places.into_iter().next().ok_or(GeocodeError::NotFound)?;
    let address = best
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| query.to_string());

    Ok(ForwardOutcome::Updated(state.clone().with_location(best.coordinates, address)))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Canned geocoder that records the queries it receives.
    #[derive(Debug, Default)]
    pub struct FakeGeocoder {
        pub reverse_result: Option<String>,
        pub search_result: Option<Vec<Place>>,
        pub queries: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        pub fn reversing_to(address: &str) -> Self {
            Self { reverse_result: Some(address.to_string()), ..Self::default() }
        }

        pub fn searching_to(places: Vec<Place>) -> Self {
            Self { search_result: Some(places), ..Self::default() }
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn reverse(&self, _coordinates: Coordinates) -> anyhow::Result<String> {
            self.reverse_result.clone().ok_or_else(|| anyhow::anyhow!("connection refused"))
        }

        async fn search(&self, query: &str) -> anyhow::Result<Vec<Place>> {
            self.queries.lock().unwrap().push(query.to_string());
            self.search_result.clone().ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeGeocoder;
    use super::*;
    use chrono::NaiveDate;

    fn state() -> AppState {
        AppState::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    fn coords() -> Coordinates {
        Coordinates::new(42.800142, -73.951401).unwrap()
    }

    #[tokio::test]
    async fn reverse_success_stores_address() {
        let geocoder = FakeGeocoder::reversing_to("Schenectady, NY");
        let next = resolve_reverse(state(), &geocoder, coords()).await;

        assert_eq!(next.coordinates, Some(coords()));
        assert_eq!(next.address, "Schenectady, NY");
        assert_eq!(next.status, LocationStatus::Resolved);
    }

    #[tokio::test]
    async fn reverse_failure_synthesizes_approximate_address() {
        let geocoder = FakeGeocoder::default();
        let next = resolve_reverse(state(), &geocoder, coords()).await;

        assert_eq!(next.address, "Approx Address for 42.800142, -73.951401");
        assert_eq!(next.status, LocationStatus::Approximate);
        assert!(next.status.geo_note().is_some());
    }

    #[tokio::test]
    async fn forward_uses_first_result() {
        let other = Coordinates::new(10.0, 20.0).unwrap();
        let geocoder = FakeGeocoder::searching_to(vec![
            Place { coordinates: coords(), display_name: Some("First".into()) },
            Place { coordinates: other, display_name: Some("Second".into()) },
        ]);

        let outcome = resolve_forward(&state(), &geocoder, "  schenectady  ").await.unwrap();
        let ForwardOutcome::Updated(next) = outcome else {
            panic!("expected an update");
        };

        assert_eq!(next.coordinates, Some(coords()));
        assert_eq!(next.address, "First");
        assert_eq!(next.status, LocationStatus::Resolved);
        assert_eq!(geocoder.queries(), vec!["schenectady".to_string()]);
    }

    #[tokio::test]
    async fn forward_without_display_name_keeps_query() {
        let geocoder = FakeGeocoder::searching_to(vec![Place {
            coordinates: coords(),
            display_name: None,
        }]);

        let outcome = resolve_forward(&state(), &geocoder, "12 Main St").await.unwrap();
        let ForwardOutcome::Updated(next) = outcome else {
            panic!("expected an update");
        };
        assert_eq!(next.address, "12 Main St");
    }

    #[tokio::test]
    async fn forward_zero_results_is_not_found() {
        let geocoder = FakeGeocoder::searching_to(Vec::new());
        let err = resolve_forward(&state(), &geocoder, "atlantis").await.unwrap_err();

        assert!(matches!(err, GeocodeError::NotFound));
        assert_eq!(err.user_message(), NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn forward_network_failure_is_unavailable() {
        let geocoder = FakeGeocoder::default();
        let err = resolve_forward(&state(), &geocoder, "atlantis").await.unwrap_err();

        assert!(matches!(err, GeocodeError::Unavailable(_)));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.user_message(), UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn forward_blank_query_is_skipped() {
        let geocoder = FakeGeocoder::default();
        let outcome = resolve_forward(&state(), &geocoder, "   ").await.unwrap();

        assert_eq!(outcome, ForwardOutcome::Skipped);
        assert!(geocoder.queries().is_empty());
    }
}
