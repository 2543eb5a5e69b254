use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;

use crate::{
    config::GeocoderConfig,
    geocode::{Geocoder, Place},
    http::{build_client, truncate_body},
    model::Coordinates,
};

/// Geocoder backed by the OpenStreetMap Nominatim API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), http }
    }

    pub fn from_config(config: &GeocoderConfig) -> Result<Self> {
        let http = build_client(&config.user_agent, config.timeout_secs)?;
        Ok(Self::new(config.base_url.clone(), http))
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, ?query, "Nominatim request");

        let res = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Nominatim ({path})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read Nominatim {path} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Nominatim {} request failed with status {}: {}",
                path,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct NmReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NmPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

fn parse_reverse(body: &str) -> Result<String> {
    let parsed: NmReverseResponse =
        serde_json::from_str(body).context("Failed to parse Nominatim reverse JSON")?;

    if let Some(error) = parsed.error {
        return Err(anyhow!("Nominatim reverse lookup failed: {error}"));
    }

    parsed
        .display_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| anyhow!("Nominatim reverse response contained no display_name"))
}

/// A JSON body that is not an array (an `{"error": ..}` object, say) means
/// nothing matched. A body that is not JSON at all is an error.
fn parse_search(body: &str) -> Result<Vec<Place>> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("Failed to parse Nominatim search JSON")?;
    if !value.is_array() {
        tracing::debug!("Nominatim search returned no result list: {}", truncate_body(body));
        return Ok(Vec::new());
    }
    let parsed: Vec<NmPlace> =
        serde_json::from_value(value).context("Unexpected Nominatim search result shape")?;

    parsed
        .into_iter()
        .map(|p| {
            Ok(Place {
                coordinates: Coordinates::parse(&p.lat, &p.lon)?,
                display_name: p.display_name,
            })
        })
        .collect()
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<String> {
        let lat = format!("{:.6}", coordinates.latitude);
        let lon = format!("{:.6}", coordinates.longitude);

        let body = self
            .get(
                "reverse",
                &[
                    ("format", "jsonv2"),
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("zoom", "16"),
                    ("addressdetails", "1"),
                ],
            )
            .await?;

        parse_reverse(&body)
    }

    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let body = self
            .get(
                "search",
                &[("format", "jsonv2"), ("q", query), ("addressdetails", "1"), ("limit", "1")],
            )
            .await?;

        parse_search(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_display_name() {
        let body = r#"{
            "place_id": 1,
            "lat": "42.8001424",
            "lon": "-73.9514012",
            "display_name": "State Street, Schenectady, New York, 12305, United States",
            "address": { "city": "Schenectady" }
        }"#;

        assert_eq!(
            parse_reverse(body).unwrap(),
            "State Street, Schenectady, New York, 12305, United States"
        );
    }

    #[test]
    fn reverse_error_payload_is_an_error() {
        let err = parse_reverse(r#"{"error":"Unable to geocode"}"#).unwrap_err();
        assert!(err.to_string().contains("Unable to geocode"));
    }

    #[test]
    fn reverse_missing_display_name_is_an_error() {
        assert!(parse_reverse(r#"{"place_id": 5}"#).is_err());
        assert!(parse_reverse("<html>").is_err());
    }

    #[test]
    fn search_parses_string_coordinates() {
        let body = r#"[
            {"lat": "42.8001424", "lon": "-73.9514012", "display_name": "Schenectady"},
            {"lat": "1", "lon": "2"}
        ]"#;

        let places = parse_search(body).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].coordinates.to_string(), "42.800142, -73.951401");
        assert_eq!(places[0].display_name.as_deref(), Some("Schenectady"));
        assert_eq!(places[1].display_name, None);
    }

    #[test]
    fn search_empty_array() {
        assert!(parse_search("[]").unwrap().is_empty());
    }

    #[test]
    fn search_error_object_means_no_match() {
        let places = parse_search(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(places.is_empty());
        assert!(parse_search("null").unwrap().is_empty());
    }

    #[test]
    fn search_non_json_is_an_error() {
        let err = parse_search("<html>Bad gateway</html>").unwrap_err();
        assert!(err.to_string().contains("Failed to parse Nominatim search JSON"));
    }

    #[test]
    fn search_rejects_bad_coordinates() {
        let err = parse_search(r#"[{"lat": "x", "lon": "2"}]"#).unwrap_err();
        assert!(err.to_string().contains("Invalid latitude"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let geocoder = NominatimGeocoder::new("https://example.org/", Client::new());
        assert_eq!(geocoder.base_url, "https://example.org");
    }
}
