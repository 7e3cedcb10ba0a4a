//! Per-render watermark description.

use super::asset_loader::MediaSource;
use super::WatermarkError;
use crate::geo::PrecisionTier;
use serde::{Deserialize, Serialize};

/// Brand wordmark drawn next to the logo.
pub const DEFAULT_WORDMARK: &str = "Sourceable";

/// Raw capture coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub lat: f64,
    pub lng: f64,
}

impl GpsCoordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Everything the overlay needs to know about one capture.
///
/// Built fresh for each render call and never mutated by the compositor.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub logo: MediaSource,
    /// Absolute URL. Displayed without its scheme.
    pub verification_url: String,
    /// Pre-formatted display text, never parsed.
    pub timestamp: String,
    pub precision: PrecisionTier,
    /// Only meaningful for radius tiers.
    pub radius_miles: Option<f64>,
    /// Caller-resolved place name.
    pub location_label: Option<String>,
    pub gps: Option<GpsCoordinates>,
    pub wordmark: String,
}

impl WatermarkSpec {
    pub fn new(
        logo: MediaSource,
        verification_url: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            logo,
            verification_url: verification_url.into(),
            timestamp: timestamp.into(),
            precision: PrecisionTier::Exact,
            radius_miles: None,
            location_label: None,
            gps: None,
            wordmark: DEFAULT_WORDMARK.to_string(),
        }
    }

    pub fn with_precision(mut self, precision: PrecisionTier) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_radius_miles(mut self, miles: f64) -> Self {
        self.radius_miles = Some(miles);
        self
    }

    pub fn with_location_label(mut self, label: impl Into<String>) -> Self {
        self.location_label = Some(label.into());
        self
    }

    pub fn with_gps(mut self, lat: f64, lng: f64) -> Self {
        self.gps = Some(GpsCoordinates::new(lat, lng));
        self
    }

    pub fn with_wordmark(mut self, wordmark: impl Into<String>) -> Self {
        self.wordmark = wordmark.into();
        self
    }

    /// Radius to display, or `None` for the exact tier.
    pub fn effective_radius_miles(&self) -> Option<f64> {
        if self.precision.is_exact() {
            return None;
        }
        self.radius_miles
            .or_else(|| self.precision.default_radius_miles())
    }

    /// Caller label with surrounding whitespace removed, if any is left.
    pub fn resolved_label(&self) -> Option<&str> {
        self.location_label
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.verification_url.trim().is_empty() {
            return Err(WatermarkError::Config(
                "verification_url cannot be empty".to_string(),
            ));
        }

        if let Some(miles) = self.radius_miles {
            if !miles.is_finite() || miles <= 0.0 {
                return Err(WatermarkError::Config(format!(
                    "radius_miles must be a positive number, got {}",
                    miles
                )));
            }
        }

        if let Some(gps) = self.gps {
            if !gps.lat.is_finite() || !gps.lng.is_finite() {
                return Err(WatermarkError::Config(
                    "GPS coordinates must be finite".to_string(),
                ));
            }
            if gps.lat.abs() > 90.0 || gps.lng.abs() > 180.0 {
                return Err(WatermarkError::Config(format!(
                    "GPS coordinates out of range: ({}, {})",
                    gps.lat, gps.lng
                )));
            }
        }

        Ok(())
    }
}

/// Strip `http://` or `https://` for display.
pub fn display_url(url: &str) -> &str {
    let trimmed = url.trim();
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
}

/// Join a verification base URL and a media slug.
pub fn verification_url(base: &str, slug: &str) -> String {
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        slug.trim().trim_start_matches('/')
    )
}
