//! Shell configuration.
//!
//! Defaults resolve from `TABSHELL_*` environment variables; an explicit
//! JSON file can override everything for reproducible runs.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tabshell_core_types::EngineVariant;
use url::Url;

use crate::errors::ShellError;

/// Configuration for the navigation shell.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Designated home location; its URL display is suppressed in chrome.
    pub home_url: Option<String>,
    /// Variant new tabs start on.
    pub default_variant: EngineVariant,
    /// Watchdog budget for a provisional load.
    pub watchdog_timeout_ms: u64,
    /// Hysteresis threshold for the scroll-direction heuristic.
    pub scroll_threshold: f64,
    /// Buffer depth for the broadcast signal buses.
    pub signal_capacity: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            home_url: resolve_home_default(),
            default_variant: resolve_variant_default(),
            watchdog_timeout_ms: resolve_u64("TABSHELL_WATCHDOG_TIMEOUT_MS", 15_000),
            scroll_threshold: resolve_f64(
                "TABSHELL_SCROLL_THRESHOLD",
                scroll_chrome::DEFAULT_THRESHOLD,
            ),
            signal_capacity: 64,
        }
    }
}

impl ShellConfig {
    /// Load from a JSON file, with `Default`/env filling absent fields.
    pub fn load(path: &Path) -> Result<Self, ShellError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog_timeout_ms)
    }

    /// Parsed home location, if one is configured and valid.
    pub fn home(&self) -> Result<Option<Url>, ShellError> {
        match &self.home_url {
            None => Ok(None),
            Some(raw) => Url::parse(raw)
                .map(Some)
                .map_err(ShellError::InvalidHomeUrl),
        }
    }
}

fn resolve_home_default() -> Option<String> {
    match env::var("TABSHELL_HOME") {
        Ok(value) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Err(_) => None,
    }
}

fn resolve_variant_default() -> EngineVariant {
    match env::var("TABSHELL_DEFAULT_VARIANT")
        .unwrap_or_default()
        .to_ascii_lowercase()
        .as_str()
    {
        "desktop" => EngineVariant::Desktop,
        _ => EngineVariant::Standard,
    }
}

fn resolve_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn resolve_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = ShellConfig::default();
        assert_eq!(config.watchdog_timeout(), Duration::from_millis(15_000));
        assert!(config.scroll_threshold > 0.0);
    }

    #[test]
    fn loads_overrides_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"home_url": "https://start.example/", "default_variant": "desktop", "watchdog_timeout_ms": 5000}}"#
        )
        .unwrap();

        let config = ShellConfig::load(file.path()).unwrap();
        assert_eq!(config.default_variant, EngineVariant::Desktop);
        assert_eq!(config.watchdog_timeout_ms, 5000);
        assert_eq!(
            config.home().unwrap(),
            Some("https://start.example/".parse().unwrap())
        );
    }

    #[test]
    fn invalid_home_url_is_rejected() {
        let config = ShellConfig {
            home_url: Some("not a url".into()),
            ..ShellConfig::default()
        };
        assert!(config.home().is_err());
    }
}
