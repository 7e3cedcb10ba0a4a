//! Decoded frame sources.

use crate::watermark::WatermarkError;
use async_trait::async_trait;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::watch;
use tracing::debug;

/// Produces decoded RGBA frames at the working resolution.
///
/// `Ok(None)` means the stream ended.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Result<Option<RgbaImage>, WatermarkError>;
}

/// Pause signal shared between the caller and a running render.
///
/// Pausing stops recording at the next frame tick; the render then
/// finalizes whatever it has and reports the artifact as incomplete.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    paused: Arc<watch::Sender<bool>>,
}

impl PlaybackHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            paused: Arc::new(tx),
        }
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.paused.subscribe()
    }
}

impl Default for PlaybackHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames decoded by an ffmpeg child process writing raw RGBA to stdout.
pub struct FfmpegFrameSource {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    frame_size: usize,
    frames_read: u64,
}

impl FfmpegFrameSource {
    pub fn spawn(
        ffmpeg: &Path,
        input: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<Self, WatermarkError> {
        let filter = format!("fps={},scale={}:{}", fps, width, height);
        let mut child = Command::new(ffmpeg)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(input)
            .args(["-vf", &filter, "-pix_fmt", "rgba", "-an", "-f", "rawvideo", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WatermarkError::SourceLoad(format!("Failed to spawn ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WatermarkError::SourceLoad("ffmpeg stdout unavailable".to_string()))?;

        debug!(input = %input.display(), width, height, fps, "Spawned frame decoder");

        Ok(Self {
            child,
            stdout,
            width,
            height,
            frame_size: width as usize * height as usize * 4,
            frames_read: 0,
        })
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

/// Fill `buf` from `reader`; returns how many bytes were read before EOF.
async fn read_full<R: AsyncReadExt + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn next_frame(&mut self) -> Result<Option<RgbaImage>, WatermarkError> {
        let mut buf = vec![0u8; self.frame_size];
        let filled = read_full(&mut self.stdout, &mut buf)
            .await
            .map_err(|e| WatermarkError::SourceLoad(format!("Frame read failed: {}", e)))?;

        if filled == 0 {
            let status = self
                .child
                .wait()
                .await
                .map_err(|e| WatermarkError::SourceLoad(format!("ffmpeg wait failed: {}", e)))?;
            if !status.success() {
                return Err(WatermarkError::SourceLoad(format!(
                    "ffmpeg decoder exited with {} after {} frames",
                    status, self.frames_read
                )));
            }
            return Ok(None);
        }
        if filled < self.frame_size {
            return Err(WatermarkError::SourceLoad(format!(
                "Truncated frame: got {} of {} bytes",
                filled, self.frame_size
            )));
        }

        self.frames_read += 1;
        RgbaImage::from_raw(self.width, self.height, buf)
            .map(Some)
            .ok_or_else(|| WatermarkError::SourceLoad("Frame buffer size mismatch".to_string()))
    }
}

/// Source path plus the temp file keeping it alive, when one was needed.
pub struct MaterializedInput {
    pub path: PathBuf,
    _temp: Option<tempfile::NamedTempFile>,
}

impl MaterializedInput {
    pub fn from_path(path: PathBuf) -> Self {
        Self { path, _temp: None }
    }

    /// Spill in-memory bytes to a temp file ffmpeg can seek in.
    pub fn spill(data: &[u8], extension: Option<&str>) -> Result<Self, WatermarkError> {
        use std::io::Write;

        let suffix = extension.map(|e| format!(".{}", e)).unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("sourceable-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| WatermarkError::SourceLoad(format!("Failed to create temp file: {}", e)))?;
        file.write_all(data)
            .and_then(|_| file.flush())
            .map_err(|e| WatermarkError::SourceLoad(format!("Failed to write temp file: {}", e)))?;

        Ok(Self {
            path: file.path().to_path_buf(),
            _temp: Some(file),
        })
    }
}
