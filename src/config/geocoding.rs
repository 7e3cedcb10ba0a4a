//! Reverse geocoding configuration.

use serde::{Deserialize, Serialize};

fn default_endpoint() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

fn default_user_agent() -> String {
    concat!("sourceable/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_zoom() -> u8 {
    14
}

fn default_cache_ttl_secs() -> u64 {
    86_400 // 24 hours
}

fn default_max_cache_entries() -> u64 {
    10_000
}

/// Geocoding is off unless enabled; exact-tier captures then show
/// coordinates instead of a place name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeocodingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            zoom: default_zoom(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_cache_entries: default_max_cache_entries(),
        }
    }
}

impl GeocodingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(format!(
                "geocoding.endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            ));
        }
        if self.timeout_secs == 0 {
            return Err("geocoding.timeout_secs must be greater than 0".to_string());
        }
        if self.zoom > 18 {
            return Err(format!("geocoding.zoom must be 0-18, got {}", self.zoom));
        }
        Ok(())
    }
}
