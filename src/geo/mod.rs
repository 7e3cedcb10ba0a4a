//! Coordinate formatting for capture locations.
//!
//! Turns a raw decimal (lat, lng) pair into display strings whose fidelity
//! matches the privacy tier chosen at capture time:
//!
//! - [`format_exact`]: degrees, minutes and seconds (`19°4'33.60"N, 72°52'39.72"E`)
//! - [`format_coarse`]: degrees and minutes only (`19°4'N, 72°52'E`)
//! - [`format_approx`]: two-decimal degrees (`19.08°N, 72.88°E`)
//! - [`format_fallback`]: four-decimal degrees, used when reverse geocoding fails
//!
//! All functions are total over finite input. Non-finite coordinates are
//! rejected upstream by [`crate::watermark::WatermarkSpec::validate`].
//!
//! # Example
//!
//! ```ignore
//! use sourceable::geo::{format_approx, format_coordinates, PrecisionTier};
//!
//! assert_eq!(format_approx(19.076, 72.8777), "19.08°N, 72.88°E");
//! let coarse = format_coordinates(19.076, 72.8777, PrecisionTier::Radius5);
//! ```

pub mod geocoder;
pub mod precision;

pub use geocoder::{GeocodeError, Geocoder, HttpGeocoder, HttpGeocoderConfig};
pub use precision::PrecisionTier;

/// A single axis split into degrees, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Dms {
    degrees: u32,
    minutes: u32,
    seconds: f64,
}

impl Dms {
    fn from_decimal(value: f64) -> Self {
        let abs = value.abs();
        let degrees = abs.floor();
        let minutes = ((abs - degrees) * 60.0).floor();
        // Rounding in the subtraction can dip just below zero at minute boundaries.
        let seconds = ((abs - degrees - minutes / 60.0) * 3600.0).max(0.0);

        Self {
            degrees: degrees as u32,
            minutes: minutes as u32,
            seconds,
        }
    }
}

fn lat_hemisphere(lat: f64) -> char {
    if lat >= 0.0 {
        'N'
    } else {
        'S'
    }
}

fn lng_hemisphere(lng: f64) -> char {
    if lng >= 0.0 {
        'E'
    } else {
        'W'
    }
}

/// Degrees, minutes and seconds (two decimals) with hemisphere letters.
pub fn format_exact(lat: f64, lng: f64) -> String {
    let la = Dms::from_decimal(lat);
    let lo = Dms::from_decimal(lng);
    format!(
        "{}°{}'{:.2}\"{}, {}°{}'{:.2}\"{}",
        la.degrees,
        la.minutes,
        la.seconds,
        lat_hemisphere(lat),
        lo.degrees,
        lo.minutes,
        lo.seconds,
        lng_hemisphere(lng)
    )
}

/// Degrees and minutes only. Sub-minute precision is dropped on purpose.
pub fn format_coarse(lat: f64, lng: f64) -> String {
    let la = Dms::from_decimal(lat);
    let lo = Dms::from_decimal(lng);
    format!(
        "{}°{}'{}, {}°{}'{}",
        la.degrees,
        la.minutes,
        lat_hemisphere(lat),
        lo.degrees,
        lo.minutes,
        lng_hemisphere(lng)
    )
}

/// Two-decimal degrees, shown as a secondary caption next to a radius label.
pub fn format_approx(lat: f64, lng: f64) -> String {
    format_decimal(lat, lng, 2)
}

/// Four-decimal degrees, shown when the geocoder could not name the place.
pub fn format_fallback(lat: f64, lng: f64) -> String {
    format_decimal(lat, lng, 4)
}

fn format_decimal(lat: f64, lng: f64, places: usize) -> String {
    format!(
        "{:.*}°{}, {:.*}°{}",
        places,
        lat.abs(),
        lat_hemisphere(lat),
        places,
        lng.abs(),
        lng_hemisphere(lng)
    )
}

/// Pick the coordinate form allowed by `tier`.
pub fn format_coordinates(lat: f64, lng: f64, tier: PrecisionTier) -> String {
    if tier.is_exact() {
        format_exact(lat, lng)
    } else {
        format_coarse(lat, lng)
    }
}
