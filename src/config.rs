//! Runtime configuration.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. optional TOML file (`--config path`)
//! 3. `.env` in the working directory (loaded into the process environment)
//! 4. `ENTSOE_*` environment variables

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::entsoe::DEFAULT_BASE_URL;
use crate::domain::area::DEFAULT_AREA_CODE;
use crate::error::{PipelineError, Result};
use crate::series::clock::DEFAULT_FALLBACK_MINUTES;

pub const ENV_API_KEY: &str = "ENTSOE_API_KEY";
pub const ENV_BASE_URL: &str = "ENTSOE_BASE_URL";
pub const ENV_DEFAULT_AREA: &str = "ENTSOE_DEFAULT_AREA";
pub const ENV_CACHE_TTL: &str = "ENTSOE_CACHE_TTL";
pub const ENV_TIMEOUT: &str = "ENTSOE_TIMEOUT";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// 0 disables the result cache.
    pub cache_ttl_secs: u64,
    pub default_area: String,
    pub fallback_resolution_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            cache_ttl_secs: 3600,
            default_area: DEFAULT_AREA_CODE.to_string(),
            fallback_resolution_minutes: DEFAULT_FALLBACK_MINUTES,
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("default_area", &self.default_area)
            .field("fallback_resolution_minutes", &self.fallback_resolution_minutes)
            .finish()
    }
}

impl Config {
    /// Load from all sources. A missing API key is not an error here.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if dotenvy::dotenv().is_ok() {
            debug!("Loaded .env");
        }
        config.apply_env(|name| std::env::var(name).ok());
        debug!("Configuration: {config:?}");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&raw)
            .map_err(|e| PipelineError::Configuration(format!("'{}': {e}", path.display())))
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply `ENTSOE_*` overrides using `lookup` to read variables.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(area) = lookup(ENV_DEFAULT_AREA).filter(|v| !v.trim().is_empty()) {
            self.default_area = crate::domain::normalize_area_code(&area);
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL) {
            match raw.trim().parse::<u64>() {
                Ok(ttl) => self.cache_ttl_secs = ttl,
                Err(_) => warn!("Ignoring {ENV_CACHE_TTL}={raw:?}: not a number of seconds"),
            }
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => warn!("Ignoring {ENV_TIMEOUT}={raw:?}: not a positive number of seconds"),
            }
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_ttl_secs > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.api_key, None);
        assert_eq!(c.base_url, "https://web-api.tp.entsoe.eu/api");
        assert_eq!(c.cache_ttl_secs, 3600);
        assert_eq!(c.default_area, "10YAT-APG------L");
        assert_eq!(c.fallback_resolution_minutes, 60);
        assert!(c.cache_enabled());
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let c = Config::from_toml("api_key = \"abc\"\ncache_ttl_secs = 0\n").unwrap();
        assert_eq!(c.api_key.as_deref(), Some("abc"));
        assert!(!c.cache_enabled());
        assert_eq!(c.timeout_secs, 30);
        assert!(Config::from_toml("timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut c = Config::from_toml("api_key = \"from-file\"\ntimeout_secs = 10\n").unwrap();
        c.apply_env(env(&[
            (ENV_API_KEY, "from-env"),
            (ENV_DEFAULT_AREA, "de"),
            (ENV_TIMEOUT, "0"),
            (ENV_CACHE_TTL, "60"),
        ]));
        assert_eq!(c.api_key.as_deref(), Some("from-env"));
        assert_eq!(c.default_area, "10YDE-VE-------2");
        assert_eq!(c.timeout_secs, 10);
        assert_eq!(c.cache_ttl_secs, 60);
    }

    #[test]
    fn blank_key_does_not_override() {
        let mut c = Config::default();
        c.apply_env(env(&[(ENV_API_KEY, "   ")]));
        assert_eq!(c.api_key, None);
    }

    #[test]
    fn debug_output_hides_the_key() {
        let c = Config {
            api_key: Some("very-secret".to_string()),
            ..Config::default()
        };
        assert!(!format!("{c:?}").contains("very-secret"));
    }

    #[test]
    fn file_loading_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entsoe.toml");
        std::fs::write(&path, "default_area = \"10YCZ-CEPS-----N\"\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().default_area, "10YCZ-CEPS-----N");

        let missing = dir.path().join("nope.toml");
        let err = Config::from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
