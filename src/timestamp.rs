//! Capture timestamp formatting.
//!
//! The compositor treats the timestamp as opaque text. These helpers build
//! that text for callers (the CLI in particular) from a capture instant.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Both timestamp forms recorded alongside a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTimestamps {
    /// RFC 3339 instant in UTC with millisecond precision.
    pub local: String,
    /// RFC 2822 style UTC string (`Tue, 05 Mar 2024 08:33:04 GMT`).
    pub utc: String,
}

impl CaptureTimestamps {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            local: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            utc: format_utc(&at),
        }
    }
}

/// Display style for an overlay timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampStyle {
    /// Long form in the capture's own offset: `March 5, 2024, 02:03:04 PM +05:30`.
    #[default]
    Local,
    /// `Tue, 05 Mar 2024 08:33:04 GMT`.
    Utc,
}

impl FromStr for TimestampStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            other => Err(format!("Unknown timestamp style '{}'", other)),
        }
    }
}

/// Parse an RFC 3339 capture instant, keeping its offset.
pub fn parse_capture_time(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim())
}

pub fn format_timestamp(at: &DateTime<FixedOffset>, style: TimestampStyle) -> String {
    match style {
        TimestampStyle::Local => at.format("%B %-d, %Y, %I:%M:%S %p %:z").to_string(),
        TimestampStyle::Utc => format_utc(&at.with_timezone(&Utc)),
    }
}

fn format_utc(at: &DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
