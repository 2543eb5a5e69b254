use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    locate::{LocateError, Locator},
    model::Coordinates,
};

pub const IP_API_URL: &str = "http://ip-api.com/json/";

/// Approximate host location from its public IP address via ip-api.com.
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    url: String,
    http: Client,
}

impl IpApiLocator {
    pub fn new(http: Client) -> Self {
        Self::with_url(IP_API_URL, http)
    }

    pub fn with_url(url: impl Into<String>, http: Client) -> Self {
        Self { url: url.into(), http }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

fn parse_response(body: &str) -> Result<Coordinates, LocateError> {
    let parsed: IpApiResponse = serde_json::from_str(body)
        .map_err(|e| LocateError::Denied(format!("Failed to parse ip-api JSON: {e}")))?;

    if parsed.status != "success" {
        let message = parsed.message.unwrap_or_else(|| "unknown failure".to_string());
        return Err(LocateError::Denied(message));
    }

    match (parsed.lat, parsed.lon) {
        (Some(lat), Some(lon)) => {
            Coordinates::new(lat, lon).map_err(|e| LocateError::Denied(e.to_string()))
        }
        _ => Err(LocateError::Denied("ip-api response contained no coordinates".to_string())),
    }
}

#[async_trait]
impl Locator for IpApiLocator {
    async fn locate(&self) -> Result<Coordinates, LocateError> {
        tracing::debug!(url = %self.url, "ip-api request");

        let res = self
            .http
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| LocateError::Denied(format!("Failed to send request to ip-api: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| LocateError::Denied(format!("Failed to read ip-api response: {e}")))?;

        if !status.is_success() {
            return Err(LocateError::Denied(format!("ip-api request failed with status {status}")));
        }

        parse_response(&body)
    }
}
