//! Source media access configuration.

use serde::{Deserialize, Serialize};

fn default_allow_remote() -> bool {
    true
}

fn default_max_source_bytes() -> u64 {
    512 * 1024 * 1024 // 512 MiB
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_logo_cache_entries() -> u64 {
    16
}

fn default_logo_cache_ttl_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourcesConfig {
    /// Allow fetching sources and logos over the network
    #[serde(default = "default_allow_remote")]
    pub allow_remote: bool,
    /// Allow plain http:// in addition to https://
    #[serde(default)]
    pub allow_insecure_http: bool,
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_logo_cache_entries")]
    pub logo_cache_entries: u64,
    #[serde(default = "default_logo_cache_ttl_secs")]
    pub logo_cache_ttl_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            allow_remote: default_allow_remote(),
            allow_insecure_http: false,
            max_source_bytes: default_max_source_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            logo_cache_entries: default_logo_cache_entries(),
            logo_cache_ttl_secs: default_logo_cache_ttl_secs(),
        }
    }
}

impl SourcesConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_source_bytes == 0 {
            return Err("sources.max_source_bytes must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("sources.request_timeout_secs must be greater than 0".to_string());
        }
        if self.allow_insecure_http && !self.allow_remote {
            return Err("sources.allow_insecure_http requires allow_remote".to_string());
        }
        Ok(())
    }
}
