//! Core library for the `luma` forecast prompt tool.
//!
//! This crate defines:
//! - The application state record and its transitions
//! - Location acquisition and geocoding (Nominatim, ip-api.com)
//! - The Luma forecast prompt and the tip gate in front of it
//! - Output dispatch: clipboard, reusable browser tabs, QR image links
//! - Configuration handling
//!
//! It is used by `forecast-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod dispatch;
pub mod gate;
pub mod geocode;
pub mod http;
pub mod locate;
pub mod model;
pub mod prompt;
pub mod qr;
pub mod session;

pub use config::Config;
pub use geocode::{GeocodeError, Geocoder, NominatimGeocoder};
pub use locate::{LocateError, Locator};
pub use model::{AppState, Coordinates, LocationSource, LocationStatus};
pub use session::{Event, Notice, Session};
