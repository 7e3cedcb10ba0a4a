// Shared fixtures for unit tests: in-memory images, specs and a fake
// media backend that records what the video pipeline sends it.

use async_trait::async_trait;
use bytes::Bytes;
use image::{ImageOutputFormat, Rgba, RgbaImage};
use sourceable::video::{
    CodecSupport, EncodingSession, FrameSource, MediaBackend, PlaybackHandle, SessionParams,
    VideoMetadata,
};
use sourceable::watermark::{MediaSource, WatermarkError, WatermarkSpec};
use std::io::Cursor;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const BACKGROUND: Rgba<u8> = Rgba([40, 90, 140, 255]);

pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

pub fn png_bytes(image: &RgbaImage) -> Bytes {
    let mut data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut data), ImageOutputFormat::Png)
        .expect("encode png");
    Bytes::from(data)
}

pub fn png_source(width: u32, height: u32, name: &str) -> MediaSource {
    MediaSource::from_named_bytes(png_bytes(&solid(width, height, BACKGROUND)), name)
}

pub fn logo_source() -> MediaSource {
    MediaSource::from_named_bytes(
        png_bytes(&solid(64, 64, Rgba([220, 30, 30, 255]))),
        "logo.png",
    )
}

pub fn broken_logo() -> MediaSource {
    MediaSource::from_named_bytes(Bytes::from_static(b"not an image"), "broken-logo.png")
}

pub fn spec() -> WatermarkSpec {
    WatermarkSpec::new(
        logo_source(),
        "https://sourceable.app/verify/abc123",
        "March 5, 2024, 02:03:04 PM +05:30",
    )
}

pub fn metadata(width: u32, height: u32, audio_tracks: usize) -> VideoMetadata {
    VideoMetadata {
        width,
        height,
        fps: Some(60.0),
        duration: 1.0,
        audio_tracks,
        rotation: 0,
    }
}

pub fn video_source() -> MediaSource {
    MediaSource::File(PathBuf::from("capture.mp4"))
}

/// What the fake backend observed during a render.
#[derive(Default)]
pub struct Recorded {
    pub params: Option<SessionParams>,
    pub pushed: Vec<RgbaImage>,
    pub finished: bool,
    pub aborted: bool,
    pub sessions_opened: usize,
}

/// Encoder set reported by the fake backend.
#[derive(Debug, Clone, Default)]
pub struct FakeCodecs(HashSet<String>);

impl FakeCodecs {
    pub fn new(names: &[&str]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

impl CodecSupport for FakeCodecs {
    fn has_encoder(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

pub struct FakeBackend {
    pub metadata: VideoMetadata,
    pub encoders: FakeCodecs,
    /// Number of frames the source yields before ending.
    pub frames: usize,
    /// Size of decoded frames; defaults to the requested size.
    pub frame_size: Option<(u32, u32)>,
    /// Fail decoding at this frame index.
    pub fail_at: Option<usize>,
    /// Pause this handle once this many frames have been produced.
    pub pause_after: Option<(usize, PlaybackHandle)>,
    pub recorded: Arc<Mutex<Recorded>>,
}

impl FakeBackend {
    pub fn new(metadata: VideoMetadata, frames: usize) -> Self {
        Self {
            metadata,
            encoders: FakeCodecs::new(&[
                "libvpx",
                "libvpx-vp9",
                "libopus",
                "libvorbis",
                "libx264",
                "aac",
            ]),
            frames,
            frame_size: None,
            fail_at: None,
            pause_after: None,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    pub fn with_encoders(mut self, names: &[&str]) -> Self {
        self.encoders = FakeCodecs::new(names);
        self
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Some((width, height));
        self
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn pausing_after(mut self, frames: usize, handle: PlaybackHandle) -> Self {
        self.pause_after = Some((frames, handle));
        self
    }

    pub fn recorded(&self) -> Arc<Mutex<Recorded>> {
        self.recorded.clone()
    }
}

struct FakeFrames {
    remaining: usize,
    produced: usize,
    width: u32,
    height: u32,
    fail_at: Option<usize>,
    pause_after: Option<(usize, PlaybackHandle)>,
}

#[async_trait]
impl FrameSource for FakeFrames {
    async fn next_frame(&mut self) -> Result<Option<RgbaImage>, WatermarkError> {
        if self.fail_at == Some(self.produced) {
            return Err(WatermarkError::SourceLoad("decoder crashed".to_string()));
        }
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        self.produced += 1;
        if let Some((after, handle)) = &self.pause_after {
            if self.produced == *after {
                handle.pause();
            }
        }
        Ok(Some(solid(self.width, self.height, BACKGROUND)))
    }
}

struct FakeSession {
    width: u32,
    height: u32,
    recorded: Arc<Mutex<Recorded>>,
}

#[async_trait]
impl EncodingSession for FakeSession {
    async fn push_frame(&mut self, frame: &RgbaImage) -> Result<(), WatermarkError> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(WatermarkError::EncodingSession(format!(
                "unexpected frame size {:?}",
                frame.dimensions()
            )));
        }
        self.recorded.lock().unwrap().pushed.push(frame.clone());
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<Bytes, WatermarkError> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.finished = true;
        Ok(Bytes::from(format!("FAKE:{}", recorded.pushed.len())))
    }

    async fn abort(self: Box<Self>) {
        self.recorded.lock().unwrap().aborted = true;
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn probe(&self, _input: &Path) -> Result<VideoMetadata, WatermarkError> {
        Ok(self.metadata.clone())
    }

    async fn codec_support(&self) -> Result<Box<dyn CodecSupport>, WatermarkError> {
        Ok(Box::new(self.encoders.clone()))
    }

    async fn open_frames(
        &self,
        _input: &Path,
        width: u32,
        height: u32,
        _fps: f64,
    ) -> Result<Box<dyn FrameSource>, WatermarkError> {
        let (width, height) = self.frame_size.unwrap_or((width, height));
        Ok(Box::new(FakeFrames {
            remaining: self.frames,
            produced: 0,
            width,
            height,
            fail_at: self.fail_at,
            pause_after: self.pause_after.clone(),
        }))
    }

    async fn open_session(
        &self,
        params: SessionParams,
    ) -> Result<Box<dyn EncodingSession>, WatermarkError> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.sessions_opened += 1;
        let session = FakeSession {
            width: params.width,
            height: params.height,
            recorded: self.recorded.clone(),
        };
        recorded.params = Some(params);
        Ok(Box::new(session))
    }
}
