use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use std::path::Path;

use crate::http::truncate_body;

pub const QR_SERVER_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";
pub const DEFAULT_SHARE_URL: &str = "https://weather-dart.github.io/weather-dart/";
pub const DEFAULT_QR_SIZE: u32 = 150;

/// Image URL of a QR code encoding `target`, `size` pixels square.
pub fn qr_image_url(target: &str, size: u32) -> Result<Url> {
    if size == 0 {
        return Err(anyhow!("QR size must be greater than zero"));
    }
    let dimensions = format!("{size}x{size}");
    Url::parse_with_params(QR_SERVER_URL, &[("data", target), ("size", dimensions.as_str())])
        .context("Failed to build QR image URL")
}

/// Fetch the rendered QR image and write it to `path`. Returns the byte count.
pub async fn download_qr(http: &Client, image_url: &Url, path: &Path) -> Result<usize> {
    tracing::debug!(url = %image_url, "QR image request");

    let res = http
        .get(image_url.clone())
        .send()
        .await
        .context("Failed to send request to QR service")?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(anyhow!(
            "QR service request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    let bytes = res.bytes().await.context("Failed to read QR image body")?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write QR image: {}", path.display()))?;

    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_share_url_is_encoded() {
        let url = qr_image_url(DEFAULT_SHARE_URL, DEFAULT_QR_SIZE).unwrap();
        assert_eq!(
            url.as_str(),
            concat!(
                "https://api.qrserver.com/v1/create-qr-code/",
                "?data=https%3A%2F%2Fweather-dart.github.io%2Fweather-dart%2F&size=150x150",
            )
        );
    }

    #[test]
    fn query_pairs_round_trip_target() {
        let target = "https://example.org/a b?c=d&e";
        let url = qr_image_url(target, 300).unwrap();
        let pairs: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();

        assert_eq!(pairs[0], ("data".to_string(), target.to_string()));
        assert_eq!(pairs[1], ("size".to_string(), "300x300".to_string()));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(qr_image_url(DEFAULT_SHARE_URL, 0).is_err());
    }
}
