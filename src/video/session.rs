//! Encoding sessions.
//!
//! A session accepts composited RGBA frames and produces the final
//! container bytes when finished. Audio is muxed straight from the
//! source file, never re-synced against the frame clock.

use super::codec::{CodecCandidate, Container};
use crate::watermark::WatermarkError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[async_trait]
pub trait EncodingSession: Send {
    async fn push_frame(&mut self, frame: &RgbaImage) -> Result<(), WatermarkError>;

    /// Flush and return the encoded stream.
    async fn finish(self: Box<Self>) -> Result<Bytes, WatermarkError>;

    /// Stop without producing output.
    async fn abort(self: Box<Self>);
}

/// Parameters for opening a session.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: CodecCandidate,
    /// Video bitrate in bits per second.
    pub video_bitrate: u32,
    /// Audio bitrate in bits per second.
    pub audio_bitrate: u32,
    /// File to take audio tracks from, if the source has any.
    pub audio_input: Option<PathBuf>,
}

impl SessionParams {
    /// ffmpeg arguments for this session.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-v".into(),
            "error".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgba".into(),
            "-s".into(),
            format!("{}x{}", self.width, self.height),
            "-r".into(),
            format!("{}", self.fps),
            "-i".into(),
            "pipe:0".into(),
        ];

        match &self.audio_input {
            Some(audio) => {
                args.extend([
                    "-i".into(),
                    audio.to_string_lossy().into_owned(),
                    "-map".into(),
                    "0:v:0".into(),
                    "-map".into(),
                    "1:a:0?".into(),
                    "-c:a".into(),
                    self.codec.audio_encoder.clone(),
                    "-b:a".into(),
                    kbps(self.audio_bitrate),
                    "-shortest".into(),
                ]);
            }
            None => args.push("-an".into()),
        }

        let video_rate = kbps(self.video_bitrate);
        args.extend([
            "-c:v".into(),
            self.codec.video_encoder.clone(),
            "-b:v".into(),
            video_rate.clone(),
            "-minrate".into(),
            video_rate.clone(),
            "-maxrate".into(),
            video_rate,
            "-pix_fmt".into(),
            "yuv420p".into(),
        ]);

        if self.codec.container == Container::Mp4 {
            // mp4 is not seekable on a pipe without fragmenting
            args.extend(["-movflags".into(), "frag_keyframe+empty_moov".into()]);
        }
        args.extend([
            "-f".into(),
            self.codec.container.muxer().into(),
            "pipe:1".into(),
        ]);
        args
    }
}

fn kbps(bits: u32) -> String {
    format!("{}k", (bits / 1000).max(1))
}

/// Session backed by an ffmpeg child reading raw frames on stdin.
pub struct FfmpegEncodingSession {
    child: Child,
    stdin: Option<ChildStdin>,
    output: JoinHandle<std::io::Result<Vec<Bytes>>>,
    stderr: JoinHandle<String>,
    frame_size: usize,
    frames: u64,
}

impl FfmpegEncodingSession {
    pub fn spawn(ffmpeg: &Path, params: &SessionParams) -> Result<Self, WatermarkError> {
        let mut child = Command::new(ffmpeg)
            .args(params.ffmpeg_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WatermarkError::EncodingSession(format!("Failed to spawn ffmpeg: {}", e))
            })?;

        let stdin = child.stdin.take();
        let mut stdout = child.stdout.take().ok_or_else(|| {
            WatermarkError::EncodingSession("ffmpeg stdout unavailable".to_string())
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            WatermarkError::EncodingSession("ffmpeg stderr unavailable".to_string())
        })?;

        // Output chunks are collected as they arrive
        let output = tokio::spawn(async move {
            let mut chunks = Vec::new();
            let mut buf = vec![0u8; 64 * 1024];
            loop {
                let n = stdout.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                chunks.push(Bytes::copy_from_slice(&buf[..n]));
            }
            Ok(chunks)
        });
        let stderr = tokio::spawn(async move {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text).await;
            text
        });

        debug!(
            codec = %params.codec.label,
            width = params.width,
            height = params.height,
            fps = params.fps,
            with_audio = params.audio_input.is_some(),
            "Opened encoding session"
        );

        Ok(Self {
            child,
            stdin,
            output,
            stderr,
            frame_size: params.width as usize * params.height as usize * 4,
            frames: 0,
        })
    }
}

#[async_trait]
impl EncodingSession for FfmpegEncodingSession {
    async fn push_frame(&mut self, frame: &RgbaImage) -> Result<(), WatermarkError> {
        if frame.as_raw().len() != self.frame_size {
            return Err(WatermarkError::EncodingSession(format!(
                "Frame is {}x{}, expected {} bytes",
                frame.width(),
                frame.height(),
                self.frame_size
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| WatermarkError::EncodingSession("Session already closed".to_string()))?;
        stdin
            .write_all(frame.as_raw())
            .await
            .map_err(|e| WatermarkError::EncodingSession(format!("Frame write failed: {}", e)))?;
        self.frames += 1;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> Result<Bytes, WatermarkError> {
        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.shutdown().await;
        }

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| WatermarkError::EncodingSession(format!("ffmpeg wait failed: {}", e)))?;
        let chunks = self
            .output
            .await
            .map_err(|e| WatermarkError::EncodingSession(format!("Output task failed: {}", e)))?
            .map_err(|e| WatermarkError::EncodingSession(format!("Output read failed: {}", e)))?;
        let stderr = self.stderr.await.unwrap_or_default();

        if !status.success() {
            return Err(WatermarkError::EncodingSession(format!(
                "ffmpeg exited with {}: {}",
                status,
                stderr.trim()
            )));
        }

        let mut out = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
        for chunk in &chunks {
            out.extend_from_slice(chunk);
        }
        debug!(frames = self.frames, bytes = out.len(), "Encoding session finished");
        Ok(out.freeze())
    }

    async fn abort(mut self: Box<Self>) {
        self.stdin.take();
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "Failed to kill ffmpeg encoder");
        }
        self.output.abort();
        self.stderr.abort();
    }
}
