// Still image path tests

use super::support::*;
use bytes::Bytes;
use image::Rgba;
use sourceable::config::Config;
use sourceable::geo::PrecisionTier;
use sourceable::watermark::image_path::{compose_still, decode_source};
use sourceable::watermark::{
    LineRole, LocationText, MediaSource, OverlayContent, OverlayStyle, RenderedMedia,
    WatermarkCompositor,
};

fn compositor() -> WatermarkCompositor {
    WatermarkCompositor::new(&Config::default()).unwrap()
}

/// Test: Output keeps the source's natural resolution
#[tokio::test]
async fn test_output_has_natural_size() {
    let encoded = compositor()
        .process_image(&png_source(1024, 683, "capture.png"), &spec())
        .await
        .unwrap();

    assert_eq!(encoded.content_type, "image/jpeg");
    assert_eq!((encoded.width, encoded.height), (1024, 683));
    let decoded = image::load_from_memory(&encoded.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1024, 683));
}

/// Test: Identical input renders identical bytes
#[tokio::test]
async fn test_render_is_deterministic() {
    let compositor = compositor();
    let source = png_source(640, 480, "capture.png");
    let spec = spec()
        .with_precision(PrecisionTier::Radius5)
        .with_gps(19.076, 72.8777);

    let first = compositor.process_image(&source, &spec).await.unwrap();
    let second = compositor.process_image(&source, &spec).await.unwrap();
    assert_eq!(first.data, second.data);
}

/// Test: process() dispatches stills to the image path
#[tokio::test]
async fn test_process_dispatches_images() {
    let rendered = compositor()
        .process(&png_source(300, 200, "capture.png"), &spec())
        .await
        .unwrap();

    assert!(matches!(rendered, RenderedMedia::Image(_)));
    assert_eq!(rendered.content_type(), "image/jpeg");
    assert_eq!(rendered.dimensions(), (300, 200));
}

/// Test: Unnamed bytes are classified by content
#[tokio::test]
async fn test_process_sniffs_unnamed_image() {
    let source = MediaSource::from_bytes(png_bytes(&solid(120, 90, BACKGROUND)));
    let rendered = compositor().process(&source, &spec()).await.unwrap();
    assert!(matches!(rendered, RenderedMedia::Image(_)));
}

/// Test: Logo failures are reported as logo errors, not source errors
#[tokio::test]
async fn test_logo_failure_is_distinct() {
    let mut spec = spec();
    spec.logo = broken_logo();

    let err = compositor()
        .process_image(&png_source(200, 200, "capture.png"), &spec)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "logo_load");
}

/// Test: Undecodable sources are source errors
#[tokio::test]
async fn test_source_failure() {
    let source = MediaSource::from_named_bytes(Bytes::from_static(b"garbage"), "capture.jpg");
    let err = compositor().process_image(&source, &spec()).await.unwrap_err();
    assert_eq!(err.kind(), "source_load");
}

/// Test: Invalid specs are rejected before any loading
#[tokio::test]
async fn test_invalid_spec_rejected() {
    let mut spec = spec();
    spec.verification_url = "  ".to_string();
    let err = compositor()
        .process_image(&png_source(200, 200, "capture.png"), &spec)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "config");
}

/// Test: Remote sources are refused when the capability is off
#[tokio::test]
async fn test_remote_capability_enforced() {
    let mut config = Config::default();
    config.sources.allow_remote = false;
    let compositor = WatermarkCompositor::new(&config).unwrap();

    let source = MediaSource::parse("https://example.com/capture.jpg").unwrap();
    let err = compositor.process_image(&source, &spec()).await.unwrap_err();
    assert_eq!(err.kind(), "source_load");
}

/// Test: Overlay is confined to the bottom-left stack
#[test]
fn test_compose_touches_only_overlay_region() {
    let source = decode_source(&png_bytes(&solid(800, 600, BACKGROUND)), Some("png")).unwrap();
    let logo = solid(48, 48, Rgba([255, 255, 255, 255]));
    let content = OverlayContent {
        url: "sourceable.app/verify/abc123".to_string(),
        wordmark: "Sourceable".to_string(),
        timestamp: "March 5, 2024".to_string(),
        location: Some("Within 5 mile radius".to_string()),
        caption: Some("approx. 19.08°N, 72.88°E".to_string()),
    };

    let canvas = compose_still(&source, &logo, &content, &OverlayStyle::default()).unwrap();
    let layout = sourceable::watermark::compute_layout(800, 600, &content);

    for y in 0..layout.top.max(0) as u32 {
        for x in (0..800).step_by(7) {
            assert_eq!(*canvas.get_pixel(x, y), BACKGROUND, "pixel {x},{y} above stack");
        }
    }
    let url = layout.line(LineRole::VerificationUrl).unwrap();
    assert!(url.top >= layout.top);
    let changed = (layout.top as u32..600)
        .flat_map(|y| (0..400).map(move |x| (x, y)))
        .filter(|&(x, y)| *canvas.get_pixel(x, y) != BACKGROUND)
        .count();
    assert!(changed > 100);
}

/// Test: Location text for radius tiers never contains seconds
#[test]
fn test_radius_content_has_no_seconds() {
    let spec = spec()
        .with_precision(PrecisionTier::Radius10)
        .with_gps(19.076, 72.8777);
    let location = LocationText {
        primary: Some(sourceable::watermark::radius_phrase(10.0)),
        caption: None,
    };
    let content = OverlayContent::from_spec(&spec, &location);
    assert_eq!(content.location.as_deref(), Some("Within 10 mile radius"));
    assert_eq!(content.url, "sourceable.app/verify/abc123");
    assert!(!content.location.unwrap().contains('"'));
}
