//! Location privacy tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How precisely a capture location is disclosed on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrecisionTier {
    #[default]
    #[serde(rename = "exact")]
    Exact,
    #[serde(rename = "radius-5", alias = "5mi")]
    Radius5,
    #[serde(rename = "radius-10", alias = "10mi")]
    Radius10,
    #[serde(rename = "radius-20", alias = "20mi")]
    Radius20,
}

impl PrecisionTier {
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact)
    }

    /// Radius implied by the tier when the caller does not supply one.
    pub fn default_radius_miles(&self) -> Option<f64> {
        match self {
            Self::Exact => None,
            Self::Radius5 => Some(5.0),
            Self::Radius10 => Some(10.0),
            Self::Radius20 => Some(20.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Radius5 => "radius-5",
            Self::Radius10 => "radius-10",
            Self::Radius20 => "radius-20",
        }
    }
}

impl fmt::Display for PrecisionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrecisionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "radius-5" | "5mi" => Ok(Self::Radius5),
            "radius-10" | "10mi" => Ok(Self::Radius10),
            "radius-20" | "20mi" => Ok(Self::Radius20),
            other => Err(format!(
                "Unknown precision tier '{}': expected exact, radius-5, radius-10 or radius-20",
                other
            )),
        }
    }
}
