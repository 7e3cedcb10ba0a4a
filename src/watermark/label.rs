//! Location text resolution.
//!
//! Decides what the location line (and, for radius tiers, the approximate
//! caption) says for a given spec. Seconds-level coordinates are only ever
//! produced for the exact tier.

use super::WatermarkSpec;
use crate::geo::{format_approx, format_exact, format_fallback, Geocoder};
use tracing::warn;

/// Resolved location text for the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationText {
    /// Main location line. `None` draws no line.
    pub primary: Option<String>,
    /// Secondary caption drawn under the radius phrase.
    pub caption: Option<String>,
}

/// `Within 5 mile radius`, `Within 2.5 mile radius`.
pub fn radius_phrase(miles: f64) -> String {
    format!("Within {} mile radius", format_miles(miles))
}

fn format_miles(miles: f64) -> String {
    if miles.fract() == 0.0 {
        format!("{:.0}", miles)
    } else {
        let text = format!("{:.2}", miles);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Resolve the location text for `spec`.
///
/// Exact tier: caller label, then the geocoder, then coordinates. A geocoder
/// failure falls back to four-decimal degrees and is only logged. Radius
/// tiers always read `Within N mile radius`.
pub async fn resolve_location(spec: &WatermarkSpec, geocoder: Option<&dyn Geocoder>) -> LocationText {
    match spec.effective_radius_miles() {
        Some(miles) => LocationText {
            primary: Some(radius_phrase(miles)),
            caption: spec
                .resolved_label()
                .map(str::to_string)
                .or_else(|| {
                    spec.gps
                        .map(|gps| format!("approx. {}", format_approx(gps.lat, gps.lng)))
                }),
        },
        None => LocationText {
            primary: resolve_exact(spec, geocoder).await,
            caption: None,
        },
    }
}

async fn resolve_exact(spec: &WatermarkSpec, geocoder: Option<&dyn Geocoder>) -> Option<String> {
    if let Some(label) = spec.resolved_label() {
        return Some(label.to_string());
    }

    let gps = spec.gps?;
    let Some(geocoder) = geocoder else {
        return Some(format_exact(gps.lat, gps.lng));
    };

    match geocoder.resolve(gps.lat, gps.lng).await {
        Ok(label) if !label.trim().is_empty() => Some(label.trim().to_string()),
        Ok(_) => {
            warn!(lat = gps.lat, lng = gps.lng, "Geocoder returned an empty label, using coordinates");
            Some(format_fallback(gps.lat, gps.lng))
        }
        Err(e) => {
            warn!(lat = gps.lat, lng = gps.lng, error = %e, "Reverse geocoding failed, using coordinates");
            Some(format_fallback(gps.lat, gps.lng))
        }
    }
}
