use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::TipGate;

pub const GEO_NOTE_UNSUPPORTED: &str = "Geolocation not supported. Enter address manually.";
pub const GEO_NOTE_DENIED: &str = "Geolocation denied. Enter address manually.";
pub const GEO_NOTE_APPROXIMATE: &str = "Reverse geocode failed - address is approximate.";

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validated constructor; rejects non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> anyhow::Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            anyhow::bail!("Latitude {latitude} is out of range (-90..=90)");
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!("Longitude {longitude} is out of range (-180..=180)");
        }
        Ok(Self { latitude, longitude })
    }

    /// Parse a pair of decimal strings, as returned by Nominatim.
    pub fn parse(latitude: &str, longitude: &str) -> anyhow::Result<Self> {
        let lat = latitude
            .trim()
            .parse::<f64>()
            .map_err(|e| anyhow::anyhow!("Invalid latitude '{latitude}': {e}"))?;
        let lon = longitude
            .trim()
            .parse::<f64>()
            .map_err(|e| anyhow::anyhow!("Invalid longitude '{longitude}': {e}"))?;
        Self::new(lat, lon)
    }
}

/// Six decimals, never a negative zero.
fn fixed6(value: f64) -> String {
    let text = format!("{:.6}", value + 0.0);
    match text.strip_prefix('-') {
        Some(rest) if rest == "0.000000" => rest.to_string(),
        _ => text,
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", fixed6(self.latitude), fixed6(self.longitude))
    }
}

/// Which representation of the location goes into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocationSource {
    #[default]
    #[serde(rename = "latlon", alias = "coordinates")]
    Coordinates,
    #[serde(rename = "address")]
    Address,
}

impl LocationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSource::Coordinates => "latlon",
            LocationSource::Address => "address",
        }
    }

    pub const fn all() -> &'static [LocationSource] {
        &[LocationSource::Coordinates, LocationSource::Address]
    }
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LocationSource {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "latlon" | "coordinates" | "coords" => Ok(LocationSource::Coordinates),
            "address" => Ok(LocationSource::Address),
            _ => Err(anyhow::anyhow!(
                "Unknown location source '{value}'. Supported sources: latlon, address."
            )),
        }
    }
}

impl std::str::FromStr for LocationSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    Unsupported,
    Denied,
}

/// Where the stored location came from and how much to trust it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationStatus {
    #[default]
    Pending,
    Resolved,
    Approximate,
    Unavailable(UnavailableReason),
}

impl LocationStatus {
    /// Note shown next to the location, if any.
    pub fn geo_note(&self) -> Option<&'static str> {
        match self {
            LocationStatus::Pending | LocationStatus::Resolved => None,
            LocationStatus::Approximate => Some(GEO_NOTE_APPROXIMATE),
            LocationStatus::Unavailable(UnavailableReason::Unsupported) => {
                Some(GEO_NOTE_UNSUPPORTED)
            }
            LocationStatus::Unavailable(UnavailableReason::Denied) => Some(GEO_NOTE_DENIED),
        }
    }
}

/// Everything the tool knows during one run. Handlers take it by value and
/// hand back the next state.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub coordinates: Option<Coordinates>,
    pub address: String,
    pub date: NaiveDate,
    pub source: LocationSource,
    pub status: LocationStatus,
    pub gate: TipGate,
    pub not_now: bool,
    pub forecast: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl AppState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            coordinates: None,
            address: String::new(),
            date,
            source: LocationSource::default(),
            status: LocationStatus::default(),
            gate: TipGate::default(),
            not_now: false,
            forecast: None,
        }
    }

    pub fn with_location(self, coordinates: Coordinates, address: String) -> Self {
        Self { coordinates: Some(coordinates), address, status: LocationStatus::Resolved, ..self }
    }

    pub fn with_coordinates(self, coordinates: Coordinates) -> Self {
        Self { coordinates: Some(coordinates), ..self }
    }

    pub fn with_address(self, address: String, status: LocationStatus) -> Self {
        Self { address, status, ..self }
    }

    pub fn with_status(self, status: LocationStatus) -> Self {
        Self { status, ..self }
    }

    pub fn with_date(self, date: NaiveDate) -> Self {
        Self { date, ..self }
    }

    pub fn with_source(self, source: LocationSource) -> Self {
        Self { source, ..self }
    }

    pub fn with_not_now(self, not_now: bool) -> Self {
        Self { not_now, ..self }
    }

    pub fn with_gate(self, gate: TipGate) -> Self {
        Self { gate, ..self }
    }

    pub fn with_forecast(self, forecast: String) -> Self {
        Self { forecast: Some(forecast), ..self }
    }

    /// Coordinates as shown to the user, or "Unavailable".
    pub fn coordinates_display(&self) -> String {
        match (self.coordinates, self.status) {
            (Some(c), _) => c.to_string(),
            (None, LocationStatus::Unavailable(_)) => "Unavailable".to_string(),
            (None, _) => String::new(),
        }
    }

    pub fn address_display(&self) -> &str {
        match self.status {
            LocationStatus::Unavailable(_) if self.address.is_empty() => "Unavailable",
            _ => &self.address,
        }
    }

    /// The location text for the currently selected source. Unset values are empty.
    pub fn location_text(&self) -> String {
        match self.source {
            LocationSource::Address => self.address.trim().to_string(),
            LocationSource::Coordinates => {
                self.coordinates.map(|c| c.to_string()).unwrap_or_default()
            }
        }
    }
}
