//! Reverse geocoding collaborator.
//!
//! The compositor only needs `resolve(lat, lng) -> label`. Failures are
//! always recovered by the caller with a coordinate fallback, so this module
//! never decides what the overlay shows.
//!
//! [`HttpGeocoder`] speaks the Nominatim reverse API (`format=jsonv2`) and
//! caches labels in memory keyed by coordinates rounded to four decimals.

use crate::config::GeocodingConfig;
use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use std::time::Duration;

/// Errors from a reverse lookup. Never surfaced to render callers.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(String),

    #[error("Geocoding service returned status {0}")]
    Status(u16),

    #[error("Geocoding response carried no label")]
    EmptyResponse,

    #[error("Geocoder configuration error: {0}")]
    Config(String),
}

/// Resolve coordinates into a human readable place name.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, lat: f64, lng: f64) -> Result<String, GeocodeError>;
}

/// Settings for [`HttpGeocoder`].
#[derive(Debug, Clone)]
pub struct HttpGeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Nominatim detail level (3 = country .. 18 = building).
    pub zoom: u8,
    pub max_cache_entries: u64,
    pub cache_ttl: Duration,
}

impl Default for HttpGeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: concat!("sourceable/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(5),
            zoom: 14,
            max_cache_entries: 10_000,
            cache_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl From<&GeocodingConfig> for HttpGeocoderConfig {
    fn from(config: &GeocodingConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            zoom: config.zoom,
            max_cache_entries: config.max_cache_entries,
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

/// Nominatim compatible reverse geocoder with an in-memory label cache.
#[derive(Clone)]
pub struct HttpGeocoder {
    config: HttpGeocoderConfig,
    client: reqwest::Client,
    cache: Cache<String, String>,
}

impl HttpGeocoder {
    pub fn new(config: HttpGeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let cache = Cache::builder()
            .max_capacity(config.max_cache_entries)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            config,
            client,
            cache,
        })
    }

    /// Number of cached labels.
    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }
}

/// Cache key for a coordinate pair (~11 m resolution).
pub fn cache_key(lat: f64, lng: f64) -> String {
    format!("{:.4},{:.4}", lat, lng)
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn resolve(&self, lat: f64, lng: f64) -> Result<String, GeocodeError> {
        let key = cache_key(lat, lng);
        if let Some(label) = self.cache.get(&key).await {
            return Ok(label);
        }

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("zoom", self.config.zoom.to_string()),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let label = body
            .display_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(GeocodeError::EmptyResponse)?;

        self.cache.insert(key, label.clone()).await;
        Ok(label)
    }
}
