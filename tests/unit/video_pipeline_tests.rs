// Video pipeline tests, driven through an in-memory media backend

use super::support::*;
use sourceable::config::Config;
use sourceable::video::{PlaybackHandle, VideoRender, VideoRenderState, VideoSettings};
use sourceable::watermark::{WatermarkCompositor, WatermarkError};
use std::sync::Arc;

fn compositor(backend: FakeBackend) -> WatermarkCompositor {
    WatermarkCompositor::new(&Config::default())
        .unwrap()
        .with_backend(Arc::new(backend))
}

/// Test: A source without audio renders; no audio input is mapped
#[tokio::test]
async fn test_zero_audio_tracks_render() {
    let backend = FakeBackend::new(metadata(320, 240, 0), 4).with_encoders(&["libvpx"]);
    let recorded = backend.recorded();

    let artifact = compositor(backend)
        .process_video(&video_source(), &spec())
        .await
        .unwrap();

    assert!(artifact.complete);
    assert_eq!(artifact.frames, 4);
    assert_eq!(artifact.codec, "video/webm;codecs=vp8,opus");
    assert_eq!(artifact.mime_type, "video/webm");
    assert_eq!(&artifact.data[..], b"FAKE:4");

    let recorded = recorded.lock().unwrap();
    assert!(recorded.finished);
    assert!(!recorded.aborted);
    assert!(recorded.params.as_ref().unwrap().audio_input.is_none());
}

/// Test: Audio tracks are passed through from the source file
#[tokio::test]
async fn test_audio_is_mapped_from_source() {
    let backend = FakeBackend::new(metadata(320, 240, 1), 2);
    let recorded = backend.recorded();

    compositor(backend)
        .process_video(&video_source(), &spec())
        .await
        .unwrap();

    let recorded = recorded.lock().unwrap();
    let params = recorded.params.as_ref().unwrap();
    assert_eq!(
        params.audio_input.as_deref(),
        Some(std::path::Path::new("capture.mp4"))
    );
    assert_eq!(params.video_bitrate, 1_000_000);
    assert_eq!(params.audio_bitrate, 128_000);
}

/// Test: Working resolution is capped and frames are resized to it
#[tokio::test]
async fn test_frames_resized_to_working_resolution() {
    let backend = FakeBackend::new(metadata(1920, 1080, 0), 2).with_frame_size(1920, 1080);
    let recorded = backend.recorded();

    let artifact = compositor(backend)
        .process_video(&video_source(), &spec())
        .await
        .unwrap();

    assert_eq!((artifact.width, artifact.height), (800, 450));
    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.pushed.len(), 2);
    assert!(recorded.pushed.iter().all(|f| f.dimensions() == (800, 450)));
}

/// Test: Portrait sources use the swapped cap
#[tokio::test]
async fn test_portrait_cap() {
    let backend = FakeBackend::new(metadata(1080, 1920, 0), 1);
    let artifact = compositor(backend)
        .process_video(&video_source(), &spec())
        .await
        .unwrap();
    assert_eq!((artifact.width, artifact.height), (450, 800));
}

/// Test: Every frame carries the same overlay
#[tokio::test]
async fn test_every_frame_is_watermarked_identically() {
    let backend = FakeBackend::new(metadata(320, 240, 0), 3);
    let recorded = backend.recorded();

    compositor(backend)
        .process_video(&video_source(), &spec())
        .await
        .unwrap();

    let recorded = recorded.lock().unwrap();
    let first = &recorded.pushed[0];
    assert!(recorded.pushed.iter().all(|f| f == first));
    assert_ne!(*first, solid(320, 240, BACKGROUND));
    // Overlay is anchored bottom-left; the top-right corner is untouched.
    assert_eq!(*first.get_pixel(315, 5), BACKGROUND);
}

/// Test: Pausing finalizes what was recorded and marks it incomplete
#[tokio::test]
async fn test_pause_produces_incomplete_artifact() {
    let playback = PlaybackHandle::new();
    let backend = FakeBackend::new(metadata(320, 240, 0), 10).pausing_after(3, playback.clone());
    let recorded = backend.recorded();

    let artifact = compositor(backend)
        .process_video_with(&video_source(), &spec(), &playback)
        .await
        .unwrap();

    assert!(!artifact.complete);
    assert_eq!(artifact.frames, 3);
    let recorded = recorded.lock().unwrap();
    assert!(recorded.finished);
    assert!(!recorded.aborted);
}

/// Test: Already-paused playback records nothing
#[tokio::test]
async fn test_paused_before_start() {
    let playback = PlaybackHandle::new();
    playback.pause();
    let backend = FakeBackend::new(metadata(320, 240, 0), 10);

    let artifact = compositor(backend)
        .process_video_with(&video_source(), &spec(), &playback)
        .await
        .unwrap();

    assert!(!artifact.complete);
    assert_eq!(artifact.frames, 0);
}

/// Test: A decode failure aborts the session and surfaces the error
#[tokio::test]
async fn test_mid_stream_failure_aborts() {
    let backend = FakeBackend::new(metadata(320, 240, 0), 10).failing_at(2);
    let recorded = backend.recorded();
    let mut render = VideoRender::new(Arc::new(backend), VideoSettings::default());
    let compositor = WatermarkCompositor::new(&Config::default()).unwrap();

    let err = render
        .run(compositor.context(), &video_source(), &spec(), &PlaybackHandle::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WatermarkError::SourceLoad(_)));
    assert_eq!(render.state(), VideoRenderState::Errored);
    let recorded = recorded.lock().unwrap();
    assert!(recorded.aborted);
    assert!(!recorded.finished);
    assert_eq!(recorded.pushed.len(), 2);
}

/// Test: Successful render ends in Done
#[tokio::test]
async fn test_state_machine_reaches_done() {
    let backend = FakeBackend::new(metadata(320, 240, 0), 1);
    let mut render = VideoRender::new(Arc::new(backend), VideoSettings::default());
    assert_eq!(render.state(), VideoRenderState::Idle);
    let compositor = WatermarkCompositor::new(&Config::default()).unwrap();

    render
        .run(compositor.context(), &video_source(), &spec(), &PlaybackHandle::new())
        .await
        .unwrap();
    assert_eq!(render.state(), VideoRenderState::Done);
}

/// Test: No supported codec fails before any session is opened
#[tokio::test]
async fn test_unsupported_codec() {
    let backend = FakeBackend::new(metadata(320, 240, 1), 3).with_encoders(&["mjpeg"]);
    let recorded = backend.recorded();

    let err = compositor(backend)
        .process_video(&video_source(), &spec())
        .await
        .unwrap_err();

    match err {
        WatermarkError::UnsupportedCodec { attempted } => {
            assert_eq!(attempted.len(), 4);
            assert_eq!(attempted[0], "video/webm;codecs=vp8,opus");
        }
        other => panic!("expected UnsupportedCodec, got {other}"),
    }
    assert_eq!(recorded.lock().unwrap().sessions_opened, 0);
}

/// Test: A broken logo stops the render before recording
#[tokio::test]
async fn test_logo_failure_records_nothing() {
    let backend = FakeBackend::new(metadata(320, 240, 0), 3);
    let recorded = backend.recorded();
    let mut spec = spec();
    spec.logo = broken_logo();

    let err = compositor(backend)
        .process_video(&video_source(), &spec)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "logo_load");
    assert_eq!(recorded.lock().unwrap().sessions_opened, 0);
}

/// Test: Artifacts can be persisted to a caller-owned file
#[tokio::test]
async fn test_persist_artifact() {
    let backend = FakeBackend::new(metadata(320, 240, 0), 2);
    let artifact = compositor(backend)
        .process_video(&video_source(), &spec())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.webm");
    artifact.persist(&path).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"FAKE:2");
}
