//! Video render pipeline.
//!
//! One render call walks `Idle -> MetadataLoaded -> Recording ->
//! Finalizing -> Done`. Any failure moves it to `Errored` and aborts the
//! encoding session so no partial stream escapes. Pausing playback is the
//! only way to stop early; the stream recorded so far is still finalized
//! but marked incomplete.

use super::backend::MediaBackend;
use super::codec::{default_candidates, negotiate, CodecCandidate};
use super::resolution::{working_resolution, ResolutionCap};
use super::session::{EncodingSession, SessionParams};
use super::source::{FrameSource, MaterializedInput, PlaybackHandle};
use crate::config::VideoConfig;
use crate::watermark::asset_loader::MediaSource;
use crate::watermark::compositor::resize_rgba;
use crate::watermark::label::resolve_location;
use crate::watermark::layout::{compute_layout, OverlayContent, OverlayLayout};
use crate::watermark::overlay::{draw_layout, prepare_logo};
use crate::watermark::processor::RenderContext;
use crate::watermark::{WatermarkError, WatermarkSpec};
use bytes::Bytes;
use image::RgbaImage;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const MIN_FPS: f64 = 1.0;
pub const MAX_FPS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoRenderState {
    Idle,
    MetadataLoaded,
    Recording,
    Finalizing,
    Done,
    Errored,
}

impl fmt::Display for VideoRenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::MetadataLoaded => "metadata_loaded",
            Self::Recording => "recording",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Finished (or paused) video render.
#[derive(Debug, Clone)]
pub struct VideoArtifact {
    pub data: Bytes,
    /// Container MIME type, e.g. `video/webm`.
    pub mime_type: &'static str,
    /// Negotiated codec label.
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frames: u64,
    /// False when playback was paused before the source ended. Callers
    /// should discard incomplete artifacts.
    pub complete: bool,
}

impl VideoArtifact {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write the stream to `path`. The caller owns the file.
    pub async fn persist(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::write(path, &self.data).await
    }
}

/// Video settings derived from configuration.
#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub cap: ResolutionCap,
    pub video_bitrate: u32,
    pub audio_bitrate: u32,
    /// Used when the source does not declare a frame rate.
    pub fallback_fps: f64,
    pub candidates: Vec<CodecCandidate>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            cap: ResolutionCap::default(),
            video_bitrate: 1_000_000,
            audio_bitrate: 128_000,
            fallback_fps: 30.0,
            candidates: default_candidates(),
        }
    }
}

impl From<&VideoConfig> for VideoSettings {
    fn from(config: &VideoConfig) -> Self {
        Self {
            cap: ResolutionCap {
                long_edge: config.max_long_edge,
                short_edge: config.max_short_edge,
            },
            video_bitrate: config.video_bitrate,
            audio_bitrate: config.audio_bitrate,
            fallback_fps: config.fallback_fps,
            candidates: config.codecs.clone(),
        }
    }
}

/// Clamp a frame rate into `MIN_FPS..=MAX_FPS`.
pub fn effective_fps(declared: Option<f64>, fallback: f64) -> f64 {
    declared
        .filter(|f| f.is_finite() && *f > 0.0)
        .unwrap_or(fallback)
        .clamp(MIN_FPS, MAX_FPS)
}

enum StopReason {
    Ended,
    Paused,
}

/// A single video render call.
pub struct VideoRender {
    render_id: Uuid,
    state: VideoRenderState,
    backend: Arc<dyn MediaBackend>,
    settings: VideoSettings,
}

impl VideoRender {
    pub fn new(backend: Arc<dyn MediaBackend>, settings: VideoSettings) -> Self {
        Self {
            render_id: Uuid::new_v4(),
            state: VideoRenderState::Idle,
            backend,
            settings,
        }
    }

    pub fn render_id(&self) -> Uuid {
        self.render_id
    }

    pub fn state(&self) -> VideoRenderState {
        self.state
    }

    fn transition(&mut self, next: VideoRenderState) {
        debug!(
            render_id = %self.render_id,
            from = %self.state,
            to = %next,
            "Video render state change"
        );
        self.state = next;
    }

    /// Render `source` with the overlay described by `spec`.
    pub async fn run(
        &mut self,
        ctx: &RenderContext,
        source: &MediaSource,
        spec: &WatermarkSpec,
        playback: &PlaybackHandle,
    ) -> Result<VideoArtifact, WatermarkError> {
        let result = self.record(ctx, source, spec, playback).await;
        if let Err(e) = &result {
            warn!(render_id = %self.render_id, kind = e.kind(), error = %e, "Video render failed");
            self.transition(VideoRenderState::Errored);
        }
        result
    }

    async fn record(
        &mut self,
        ctx: &RenderContext,
        source: &MediaSource,
        spec: &WatermarkSpec,
        playback: &PlaybackHandle,
    ) -> Result<VideoArtifact, WatermarkError> {
        let input = materialize(ctx, source).await?;
        let metadata = self.backend.probe(&input.path).await?;
        self.transition(VideoRenderState::MetadataLoaded);

        let (width, height) = working_resolution(metadata.width, metadata.height, self.settings.cap);
        if width == 0 || height == 0 {
            return Err(WatermarkError::SourceLoad(format!(
                "Video has unusable dimensions {}x{}",
                metadata.width, metadata.height
            )));
        }

        // Nothing is recorded without a logo.
        let logo = ctx.loader.load_logo(&spec.logo).await?;
        let location = resolve_location(spec, ctx.geocoder.as_deref()).await;
        let content = OverlayContent::from_spec(spec, &location);
        let layout = compute_layout(width, height, &content);
        let logo = prepare_logo(&logo, &layout)?;

        let support = self.backend.codec_support().await?;
        let codec = negotiate(&self.settings.candidates, support.as_ref(), metadata.has_audio())?;
        let fps = effective_fps(metadata.fps, self.settings.fallback_fps);

        info!(
            render_id = %self.render_id,
            source = %source.describe(),
            source_width = metadata.width,
            source_height = metadata.height,
            width,
            height,
            fps,
            audio_tracks = metadata.audio_tracks,
            codec = %codec.label,
            "Starting video render"
        );

        let mut frames = self
            .backend
            .open_frames(&input.path, width, height, fps)
            .await?;
        let params = SessionParams {
            width,
            height,
            fps,
            codec: codec.clone(),
            video_bitrate: self.settings.video_bitrate,
            audio_bitrate: self.settings.audio_bitrate,
            audio_input: metadata.has_audio().then(|| input.path.clone()),
        };
        let mut session = self.backend.open_session(params).await?;
        self.transition(VideoRenderState::Recording);

        let recorded = record_frames(
            frames.as_mut(),
            session.as_mut(),
            &layout,
            &logo,
            ctx,
            fps,
            playback,
        )
        .await;
        let (frame_count, reason) = match recorded {
            Ok(done) => done,
            Err(e) => {
                session.abort().await;
                return Err(e);
            }
        };
        drop(frames);

        self.transition(VideoRenderState::Finalizing);
        let data = session.finish().await?;
        let complete = matches!(reason, StopReason::Ended);
        self.transition(VideoRenderState::Done);

        info!(
            render_id = %self.render_id,
            frames = frame_count,
            bytes = data.len(),
            complete,
            "Video render finished"
        );

        Ok(VideoArtifact {
            data,
            mime_type: codec.container.mime_type(),
            codec: codec.label,
            width,
            height,
            frames: frame_count,
            complete,
        })
    }
}

async fn materialize(ctx: &RenderContext, source: &MediaSource) -> Result<MaterializedInput, WatermarkError> {
    match source {
        MediaSource::File(path) => Ok(MaterializedInput::from_path(path.clone())),
        _ => {
            let data = ctx
                .loader
                .load_bytes(source)
                .await
                .map_err(|e| WatermarkError::SourceLoad(e.to_string()))?;
            MaterializedInput::spill(&data, source.extension().as_deref())
        }
    }
}

/// Pull frames on the frame clock until the source ends or playback pauses.
async fn record_frames(
    frames: &mut dyn FrameSource,
    session: &mut dyn EncodingSession,
    layout: &OverlayLayout,
    logo: &RgbaImage,
    ctx: &RenderContext,
    fps: f64,
    playback: &PlaybackHandle,
) -> Result<(u64, StopReason), WatermarkError> {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut paused = playback.subscribe();
    let mut watching = true;
    let mut count = 0u64;

    loop {
        if *paused.borrow_and_update() {
            return Ok((count, StopReason::Paused));
        }

        tokio::select! {
            biased;
            changed = paused.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let Some(frame) = frames.next_frame().await? else {
            return Ok((count, StopReason::Ended));
        };

        let mut canvas = if (frame.width(), frame.height()) == (layout.canvas_width, layout.canvas_height) {
            frame
        } else {
            resize_rgba(&frame, layout.canvas_width, layout.canvas_height)?
        };
        draw_layout(&mut canvas, logo, layout, &ctx.style)?;
        session.push_frame(&canvas).await?;
        count += 1;
    }
}
