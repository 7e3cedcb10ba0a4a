//! Media runtime abstraction.
//!
//! The pipeline talks to a [`MediaBackend`] for probing, decoding and
//! encoding. [`FfmpegBackend`] drives the ffmpeg/ffprobe binaries; tests
//! substitute an in-memory backend.

use super::codec::{query_encoders, CodecSupport, FfmpegCodecSupport};
use super::probe::{probe_video, VideoMetadata};
use super::session::{EncodingSession, FfmpegEncodingSession, SessionParams};
use super::source::{FfmpegFrameSource, FrameSource};
use crate::config::VideoConfig;
use crate::watermark::WatermarkError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::info;

#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn probe(&self, input: &Path) -> Result<VideoMetadata, WatermarkError>;

    /// Encoders available to [`MediaBackend::open_session`], probed once.
    async fn codec_support(&self) -> Result<Box<dyn CodecSupport>, WatermarkError>;

    async fn open_frames(
        &self,
        input: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<Box<dyn FrameSource>, WatermarkError>;

    async fn open_session(
        &self,
        params: SessionParams,
    ) -> Result<Box<dyn EncodingSession>, WatermarkError>;
}

/// Backend using ffmpeg binaries found on `PATH` (or configured paths).
pub struct FfmpegBackend {
    ffmpeg: String,
    ffprobe: String,
    resolved_ffmpeg: OnceCell<PathBuf>,
    resolved_ffprobe: OnceCell<PathBuf>,
    codec_support: OnceCell<FfmpegCodecSupport>,
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            resolved_ffmpeg: OnceCell::new(),
            resolved_ffprobe: OnceCell::new(),
            codec_support: OnceCell::new(),
        }
    }

    pub fn from_config(config: &VideoConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone())
    }

    async fn ffmpeg(&self) -> Result<&Path, WatermarkError> {
        self.resolved_ffmpeg
            .get_or_try_init(|| async { resolve_binary(&self.ffmpeg) })
            .await
            .map(PathBuf::as_path)
    }

    async fn ffprobe(&self) -> Result<&Path, WatermarkError> {
        self.resolved_ffprobe
            .get_or_try_init(|| async { resolve_binary(&self.ffprobe) })
            .await
            .map(PathBuf::as_path)
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

fn resolve_binary(name: &str) -> Result<PathBuf, WatermarkError> {
    which::which(name).map_err(|e| {
        WatermarkError::EncodingSession(format!("{} not found: {}", name, e))
    })
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe(&self, input: &Path) -> Result<VideoMetadata, WatermarkError> {
        let ffprobe = self
            .ffprobe()
            .await
            .map_err(|e| WatermarkError::SourceLoad(e.to_string()))?;
        probe_video(ffprobe, input).await
    }

    async fn codec_support(&self) -> Result<Box<dyn CodecSupport>, WatermarkError> {
        let ffmpeg = self.ffmpeg().await?;
        let list = self
            .codec_support
            .get_or_try_init(|| async {
                let list = query_encoders(ffmpeg).await?;
                info!(count = list.len(), "Discovered ffmpeg encoders");
                Ok::<_, WatermarkError>(list)
            })
            .await?;
        Ok(Box::new(list.clone()))
    }

    async fn open_frames(
        &self,
        input: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<Box<dyn FrameSource>, WatermarkError> {
        let ffmpeg = self
            .ffmpeg()
            .await
            .map_err(|e| WatermarkError::SourceLoad(e.to_string()))?;
        let source = FfmpegFrameSource::spawn(ffmpeg, input, width, height, fps)?;
        Ok(Box::new(source))
    }

    async fn open_session(
        &self,
        params: SessionParams,
    ) -> Result<Box<dyn EncodingSession>, WatermarkError> {
        let ffmpeg = self.ffmpeg().await?;
        let session = FfmpegEncodingSession::spawn(ffmpeg, &params)?;
        Ok(Box::new(session))
    }
}
