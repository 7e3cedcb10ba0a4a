// Overlay layout tests

use rstest::rstest;
use sourceable::watermark::layout::FontWeight;
use sourceable::watermark::{compute_layout, LineRole, OverlayContent, MAX_OVERLAY_FRACTION};

fn full_content() -> OverlayContent {
    OverlayContent {
        url: "sourceable.app/verify/abc123".to_string(),
        wordmark: "Sourceable".to_string(),
        timestamp: "March 5, 2024, 02:03:04 PM +05:30".to_string(),
        location: Some("Within 5 mile radius".to_string()),
        caption: Some("approx. 19.08°N, 72.88°E".to_string()),
    }
}

/// Test: Lines stack bottom-up in a fixed order at every size
#[rstest]
#[case(100, 100)]
#[case(640, 480)]
#[case(1000, 750)]
#[case(1080, 1920)]
#[case(4000, 3000)]
#[case(4000, 500)]
fn test_stack_order(#[case] width: u32, #[case] height: u32) {
    let layout = compute_layout(width, height, &full_content());
    let top = |role| layout.line(role).unwrap().top;

    assert!(top(LineRole::Timestamp) > top(LineRole::Caption));
    assert!(top(LineRole::Caption) > top(LineRole::Location));
    assert!(top(LineRole::Location) > layout.brand_top);
    assert!(layout.brand_top > top(LineRole::VerificationUrl));
    assert_eq!(top(LineRole::VerificationUrl), layout.top);
    assert!(top(LineRole::Timestamp) < height as i32);
}

/// Test: Stack never exceeds the area cap
#[rstest]
#[case(100, 100)]
#[case(800, 600)]
#[case(4000, 500)]
#[case(2000, 120)]
#[case(600, 800)]
fn test_stack_respects_cap(#[case] width: u32, #[case] height: u32) {
    let layout = compute_layout(width, height, &full_content());
    let cap = MAX_OVERLAY_FRACTION * width.min(height) as f32;
    assert!(
        layout.stack_height() as f32 <= cap + 1.0,
        "stack {} exceeds cap {} at {}x{}",
        layout.stack_height(),
        cap,
        width,
        height
    );
    assert!(layout.scale <= 1.0);
}

/// Test: Metrics shrink uniformly when capped
#[test]
fn test_capped_layout_scales_uniformly() {
    let wide = compute_layout(4000, 500, &full_content());
    assert!(wide.scale < 1.0);

    let ts = wide.line(LineRole::Timestamp).unwrap();
    let url = wide.line(LineRole::VerificationUrl).unwrap();
    let ratio = ts.font_size / url.font_size;
    let natural = compute_layout(4000, 3000, &full_content());
    let natural_ratio = natural.line(LineRole::Timestamp).unwrap().font_size
        / natural.line(LineRole::VerificationUrl).unwrap().font_size;
    assert!((ratio - natural_ratio).abs() < 1e-4);
}

/// Test: Text lines share the left inset, wordmark sits right of the logo
#[rstest]
#[case(320)]
#[case(1920)]
fn test_horizontal_alignment(#[case] width: u32) {
    let layout = compute_layout(width, width * 3 / 4, &full_content());
    let inset = (0.04 * width as f32).round() as i32;

    for line in layout.lines.iter().filter(|l| l.role != LineRole::Wordmark) {
        assert_eq!(line.x, inset, "{:?}", line.role);
    }
    assert_eq!(layout.logo.x, inset);
    let wordmark = layout.line(LineRole::Wordmark).unwrap();
    assert!(wordmark.x >= layout.logo.x + layout.logo.size as i32);
    assert_eq!(wordmark.weight, FontWeight::Bold);
}

/// Test: Optional lines are omitted and the stack shrinks
#[test]
fn test_optional_lines_omitted() {
    let mut content = full_content();
    let full = compute_layout(800, 600, &content);
    content.location = None;
    content.caption = None;
    let bare = compute_layout(800, 600, &content);

    assert!(bare.line(LineRole::Location).is_none());
    assert!(bare.line(LineRole::Caption).is_none());
    assert_eq!(bare.lines.len(), 3);
    assert!(bare.stack_height() < full.stack_height());
}

/// Test: Larger canvases get larger type
#[test]
fn test_font_scales_with_width() {
    let small = compute_layout(400, 300, &full_content());
    let large = compute_layout(1600, 1200, &full_content());
    let size = |l: &sourceable::watermark::OverlayLayout| {
        l.line(LineRole::Timestamp).unwrap().font_size
    };
    assert!((size(&large) / size(&small) - 4.0).abs() < 1e-3);
}
