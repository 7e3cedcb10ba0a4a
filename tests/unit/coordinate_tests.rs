// Coordinate formatting tests

use sourceable::geo::{
    format_approx, format_coarse, format_coordinates, format_exact, format_fallback,
    PrecisionTier,
};

const MUMBAI: (f64, f64) = (19.076, 72.8777);

#[test]
fn test_approx_example() {
    assert_eq!(format_approx(MUMBAI.0, MUMBAI.1), "19.08°N, 72.88°E");
}

#[test]
fn test_exact_has_seconds_with_two_decimals() {
    let text = format_exact(MUMBAI.0, MUMBAI.1);
    assert_eq!(text, "19°4'33.60\"N, 72°52'39.72\"E");
}

#[test]
fn test_coarse_drops_seconds() {
    let text = format_coarse(MUMBAI.0, MUMBAI.1);
    assert_eq!(text, "19°4'N, 72°52'E");
    assert!(!text.contains('"'));
}

/// Test: Seconds appear only for the exact tier
#[test]
fn test_seconds_only_for_exact_tier() {
    for tier in [
        PrecisionTier::Radius5,
        PrecisionTier::Radius10,
        PrecisionTier::Radius20,
    ] {
        assert!(!format_coordinates(MUMBAI.0, MUMBAI.1, tier).contains('"'));
    }
    assert!(format_coordinates(MUMBAI.0, MUMBAI.1, PrecisionTier::Exact).contains('"'));
}

/// Test: Hemisphere letters follow sign, magnitudes are absolute
#[test]
fn test_hemispheres() {
    assert_eq!(format_approx(-22.9068, -43.1729), "22.91°S, 43.17°W");
    assert_eq!(format_fallback(-22.9068, -43.1729), "22.9068°S, 43.1729°W");
    assert_eq!(format_approx(51.5074, -0.1278), "51.51°N, 0.13°W");
    assert!(!format_exact(-22.9068, -43.1729).contains('-'));
}

/// Test: Extremes of the coordinate range
#[test]
fn test_extremes() {
    assert_eq!(format_coarse(90.0, 180.0), "90°0'N, 180°0'E");
    assert_eq!(format_coarse(-90.0, -180.0), "90°0'S, 180°0'W");
    assert_eq!(format_approx(0.0, 0.0), "0.00°N, 0.00°E");
}

#[test]
fn test_tier_names_round_trip_display() {
    for tier in [
        PrecisionTier::Exact,
        PrecisionTier::Radius5,
        PrecisionTier::Radius10,
        PrecisionTier::Radius20,
    ] {
        assert_eq!(tier.to_string().parse::<PrecisionTier>().unwrap(), tier);
    }
}

fn sweep_values(limit: f64) -> Vec<f64> {
    let mut values = vec![
        -limit,
        -limit + 1e-6,
        -45.5,
        -1.0 / 60.0,
        -0.5,
        -1e-6,
        0.0,
        1e-6,
        1.0 / 60.0 - 1e-9,
        1.0 / 60.0,
        1.0 / 60.0 + 1e-9,
        19.076,
        29.999_999,
        limit - 1e-6,
        limit,
    ];
    let mut v = -limit;
    while v <= limit {
        values.push(v);
        v += 7.3;
    }
    values
}

fn split_axes(text: &str) -> (&str, &str) {
    text.split_once(", ").expect("two comma-separated axes")
}

fn hemisphere_letters(axis: &str) -> Vec<char> {
    axis.chars().filter(|c| "NSEW".contains(*c)).collect()
}

/// Test: Every form carries exactly one hemisphere letter per axis, matching its sign
#[test]
fn test_hemisphere_letter_matches_sign_across_sweep() {
    for lat in sweep_values(90.0) {
        for lng in sweep_values(180.0) {
            let want_lat = if lat < 0.0 { 'S' } else { 'N' };
            let want_lng = if lng < 0.0 { 'W' } else { 'E' };

            for text in [
                format_exact(lat, lng),
                format_coarse(lat, lng),
                format_approx(lat, lng),
                format_fallback(lat, lng),
            ] {
                let (lat_axis, lng_axis) = split_axes(&text);
                assert_eq!(hemisphere_letters(lat_axis), vec![want_lat], "{text} for {lat}");
                assert_eq!(hemisphere_letters(lng_axis), vec![want_lng], "{text} for {lng}");
                assert!(!text.contains('-'), "{text} shows a sign");
            }
        }
    }
}

/// Test: Coarse degrees and minutes are exactly those shown by the exact form
#[test]
fn test_coarse_digits_agree_with_exact_across_sweep() {
    for lat in sweep_values(90.0) {
        for lng in sweep_values(180.0) {
            let exact = format_exact(lat, lng);
            let coarse = format_coarse(lat, lng);
            let (exact_lat, exact_lng) = split_axes(&exact);
            let (coarse_lat, coarse_lng) = split_axes(&coarse);

            for (exact_axis, coarse_axis) in [(exact_lat, coarse_lat), (exact_lng, coarse_lng)] {
                let (deg_min, _) = coarse_axis.split_at(coarse_axis.len() - 1);
                assert!(
                    exact_axis.starts_with(deg_min),
                    "coarse {coarse} disagrees with exact {exact}"
                );
                assert!(!coarse_axis.contains('"'));
            }
        }
    }
}
