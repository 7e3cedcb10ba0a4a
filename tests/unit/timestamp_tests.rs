// Timestamp formatting tests

use chrono::{TimeZone, Utc};
use sourceable::timestamp::{
    format_timestamp, parse_capture_time, CaptureTimestamps, TimestampStyle,
};

#[test]
fn test_local_form_uses_capture_offset() {
    let at = parse_capture_time("2024-12-31T23:59:59-08:00").unwrap();
    assert_eq!(
        format_timestamp(&at, TimestampStyle::Local),
        "December 31, 2024, 11:59:59 PM -08:00"
    );
}

#[test]
fn test_utc_form_crosses_date_line() {
    let at = parse_capture_time("2024-12-31T23:59:59-08:00").unwrap();
    assert_eq!(
        format_timestamp(&at, TimestampStyle::Utc),
        "Wed, 01 Jan 2025 07:59:59 GMT"
    );
}

#[test]
fn test_capture_pair_is_consistent() {
    let at = Utc.with_ymd_and_hms(2023, 7, 14, 6, 5, 0).unwrap();
    let stamps = CaptureTimestamps::from_datetime(at);
    let parsed = parse_capture_time(&stamps.local).unwrap();
    assert_eq!(format_timestamp(&parsed, TimestampStyle::Utc), stamps.utc);
}

#[test]
fn test_style_parsing() {
    assert_eq!("UTC".parse::<TimestampStyle>().unwrap(), TimestampStyle::Utc);
    assert_eq!("local".parse::<TimestampStyle>().unwrap(), TimestampStyle::Local);
    assert!("iso".parse::<TimestampStyle>().is_err());
}
