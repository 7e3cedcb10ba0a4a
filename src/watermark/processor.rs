//! Compositor entry point.
//!
//! [`WatermarkCompositor`] owns the collaborators a render needs (asset
//! loader, optional geocoder, still encoder, media backend) and dispatches
//! each call to the image or video path by media kind. Both paths draw the
//! same overlay.
//!
//! # Example
//!
//! ```ignore
//! use sourceable::config::Config;
//! use sourceable::watermark::{MediaSource, WatermarkCompositor, WatermarkSpec};
//!
//! let compositor = WatermarkCompositor::new(&Config::default())?;
//! let spec = WatermarkSpec::new(logo, "https://sourceable.app/verify/abc123", timestamp);
//! let rendered = compositor.process(&MediaSource::parse("capture.jpg")?, &spec).await?;
//! ```

use super::asset_loader::{AssetLoader, AssetLoaderConfig, MediaKind, MediaSource};
use super::encoder::{EncodedImage, ImageEncoder, JpegEncoder};
use super::image_path;
use super::overlay::OverlayStyle;
use super::{WatermarkError, WatermarkSpec};
use crate::config::Config;
use crate::geo::{Geocoder, HttpGeocoder, HttpGeocoderConfig};
use crate::video::{FfmpegBackend, MediaBackend, PlaybackHandle, VideoArtifact, VideoRender, VideoSettings};
use std::sync::Arc;
use tracing::{debug, info};

/// Collaborators shared by every render call.
#[derive(Clone)]
pub struct RenderContext {
    pub loader: AssetLoader,
    pub geocoder: Option<Arc<dyn Geocoder>>,
    pub style: OverlayStyle,
    pub encoder: Arc<dyn ImageEncoder>,
}

/// Output of [`WatermarkCompositor::process`].
#[derive(Debug, Clone)]
pub enum RenderedMedia {
    Image(EncodedImage),
    Video(VideoArtifact),
}

impl RenderedMedia {
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Image(_) => MediaKind::Image,
            Self::Video(_) => MediaKind::Video,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Image(image) => image.content_type,
            Self::Video(video) => video.mime_type,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Self::Image(image) => &image.data,
            Self::Video(video) => &video.data,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Image(image) => (image.width, image.height),
            Self::Video(video) => (video.width, video.height),
        }
    }
}

pub struct WatermarkCompositor {
    ctx: RenderContext,
    backend: Arc<dyn MediaBackend>,
    video: VideoSettings,
}

impl WatermarkCompositor {
    /// Build a compositor from configuration.
    ///
    /// The HTTP geocoder is attached only when `geocoding.enabled` is set.
    pub fn new(config: &Config) -> Result<Self, WatermarkError> {
        let loader = AssetLoader::new(AssetLoaderConfig::from(&config.sources))?;
        let style = OverlayStyle::from_config(&config.branding)?;

        let geocoder: Option<Arc<dyn Geocoder>> = if config.geocoding.enabled {
            let geocoder = HttpGeocoder::new(HttpGeocoderConfig::from(&config.geocoding))
                .map_err(|e| WatermarkError::Config(e.to_string()))?;
            Some(Arc::new(geocoder))
        } else {
            None
        };

        Ok(Self {
            ctx: RenderContext {
                loader,
                geocoder,
                style,
                encoder: Arc::new(JpegEncoder::new(config.image.jpeg_quality)),
            },
            backend: Arc::new(FfmpegBackend::from_config(&config.video)),
            video: VideoSettings::from(&config.video),
        })
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.ctx.geocoder = Some(geocoder);
        self
    }

    pub fn without_geocoder(mut self) -> Self {
        self.ctx.geocoder = None;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn ImageEncoder>) -> Self {
        self.ctx.encoder = encoder;
        self
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.ctx.style = style;
        self
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn video_settings(&self) -> &VideoSettings {
        &self.video
    }

    /// Watermark `source`, choosing the path by media kind.
    pub async fn process(
        &self,
        source: &MediaSource,
        spec: &WatermarkSpec,
    ) -> Result<RenderedMedia, WatermarkError> {
        let (source, kind) = self.classify(source).await?;
        debug!(source = %source.describe(), kind = ?kind, "Dispatching render");
        match kind {
            MediaKind::Image => self.process_image(&source, spec).await.map(RenderedMedia::Image),
            MediaKind::Video => self.process_video(&source, spec).await.map(RenderedMedia::Video),
        }
    }

    pub async fn process_image(
        &self,
        source: &MediaSource,
        spec: &WatermarkSpec,
    ) -> Result<EncodedImage, WatermarkError> {
        spec.validate()?;
        image_path::process_image(&self.ctx, source, spec).await
    }

    pub async fn process_video(
        &self,
        source: &MediaSource,
        spec: &WatermarkSpec,
    ) -> Result<VideoArtifact, WatermarkError> {
        self.process_video_with(source, spec, &PlaybackHandle::new())
            .await
    }

    /// Like [`Self::process_video`], stopping early if `playback` pauses.
    pub async fn process_video_with(
        &self,
        source: &MediaSource,
        spec: &WatermarkSpec,
        playback: &PlaybackHandle,
    ) -> Result<VideoArtifact, WatermarkError> {
        spec.validate()?;
        let mut render = VideoRender::new(self.backend.clone(), self.video.clone());
        info!(render_id = %render.render_id(), source = %source.describe(), "Video render requested");
        render.run(&self.ctx, source, spec, playback).await
    }

    /// Media kind from the source name, else from its leading bytes.
    ///
    /// Sniffed sources come back as in-memory bytes so they are not
    /// fetched twice.
    async fn classify(&self, source: &MediaSource) -> Result<(MediaSource, MediaKind), WatermarkError> {
        if let Some(kind) = source.kind_hint() {
            return Ok((source.clone(), kind));
        }

        let data = self
            .ctx
            .loader
            .load_bytes(source)
            .await
            .map_err(|e| WatermarkError::SourceLoad(e.to_string()))?;
        let extension = source.extension();
        let kind = MediaKind::detect(&data, extension.as_deref()).ok_or_else(|| {
            WatermarkError::SourceLoad(format!("Unrecognized media type: {}", source.describe()))
        })?;
        Ok((MediaSource::from_bytes(data), kind))
    }
}
