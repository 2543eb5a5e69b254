use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    dispatch::{LinkPurpose, LinkRegistry, LinkTarget, TabOpener},
    model::LocationSource,
    prompt::{DEFAULT_SESSION_MARKER, SessionMarker},
    qr::{DEFAULT_QR_SIZE, DEFAULT_SHARE_URL},
};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_CHAT_URL: &str = "https://chat.openai.com/chat";
pub const DEFAULT_CHAT_TAB: &str = "chatgpt";
pub const DEFAULT_USER_AGENT: &str = concat!("luma-forecast/", env!("CARGO_PKG_VERSION"));

/// Geocoding service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    /// Nominatim asks every client to identify itself.
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: Some(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    /// Look up the approximate location from the public IP on start.
    pub enabled: bool,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub chat_url: String,
    pub chat_tab: String,
    pub share_url: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            chat_url: DEFAULT_CHAT_URL.to_string(),
            chat_tab: DEFAULT_CHAT_TAB.to_string(),
            share_url: DEFAULT_SHARE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    pub size: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self { size: DEFAULT_QR_SIZE }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_source = "address"
///
/// [geocoder]
/// base_url = "https://nominatim.openstreetmap.org"
/// user_agent = "luma-forecast/0.1.0 (me@example.org)"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_source: LocationSource,
    pub session_marker: String,
    pub geocoder: GeocoderConfig,
    pub locate: LocateConfig,
    pub links: LinksConfig,
    pub qr: QrConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_source: LocationSource::default(),
            session_marker: DEFAULT_SESSION_MARKER.to_string(),
            geocoder: GeocoderConfig::default(),
            locate: LocateConfig::default(),
            links: LinksConfig::default(),
            qr: QrConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.session_marker()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dart", "luma")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn session_marker(&self) -> Result<SessionMarker> {
        SessionMarker::new(&self.session_marker)
    }

    /// Link registry for the configured chat and share pages.
    pub fn link_registry(&self, opener: Box<dyn TabOpener>) -> LinkRegistry {
        LinkRegistry::new(opener)
            .register(
                LinkPurpose::Chat,
                LinkTarget::new(self.links.chat_url.clone(), self.links.chat_tab.clone()),
            )
            .register(LinkPurpose::Share, LinkTarget::new(self.links.share_url.clone(), "share"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.geocoder.base_url, DEFAULT_NOMINATIM_URL);
        assert_eq!(cfg.links.chat_tab, "chatgpt");
        assert!(cfg.locate.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml(
            r#"
            default_source = "address"

            [geocoder]
            user_agent = "luma-test (ops@example.org)"

            [qr]
            size = 300
            "#,
        )
        .unwrap();

        assert_eq!(cfg.default_source, LocationSource::Address);
        assert_eq!(cfg.geocoder.user_agent, "luma-test (ops@example.org)");
        assert_eq!(cfg.geocoder.base_url, DEFAULT_NOMINATIM_URL);
        assert_eq!(cfg.geocoder.timeout_secs, Some(15));
        assert_eq!(cfg.qr.size, 300);
        assert_eq!(cfg.links, LinksConfig::default());
    }

    #[test]
    fn invalid_session_marker_is_rejected() {
        let err = Config::from_toml(r#"session_marker = "x; }""#).unwrap_err();
        assert!(err.to_string().contains("Invalid session marker"));
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Config::from_toml(r#"default_source = "zip""#).is_err());
    }

    #[test]
    fn toml_round_trip() {
        let mut cfg = Config::default();
        cfg.links.chat_tab = "luma-chat".to_string();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn link_registry_has_both_purposes() {
        use crate::dispatch::links::testing::RecordingOpener;

        let opener = RecordingOpener::default();
        let mut links = Config::default().link_registry(Box::new(opener.clone()));
        links.open_or_focus(LinkPurpose::Chat).unwrap();
        links.open_or_focus(LinkPurpose::Share).unwrap();

        assert_eq!(opener.opened_urls(), vec![DEFAULT_CHAT_URL, DEFAULT_SHARE_URL]);
        assert_eq!(opener.opened(), vec![DEFAULT_CHAT_TAB, "share"]);
    }
}
