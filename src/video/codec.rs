//! Output codec negotiation.
//!
//! Candidates are tried in order and the first one the encoder runtime
//! supports wins. When none match the render fails with the full list of
//! attempted candidates; a stream is never written with a guessed codec.

use crate::watermark::WatermarkError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Webm,
    Mp4,
}

impl Container {
    /// ffmpeg muxer name.
    pub fn muxer(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }
}

/// One container/codec combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecCandidate {
    /// MIME label, e.g. `video/webm;codecs=vp8,opus`.
    pub label: String,
    pub container: Container,
    /// ffmpeg video encoder name.
    pub video_encoder: String,
    /// ffmpeg audio encoder name.
    pub audio_encoder: String,
}

impl CodecCandidate {
    pub fn new(label: &str, container: Container, video_encoder: &str, audio_encoder: &str) -> Self {
        Self {
            label: label.to_string(),
            container,
            video_encoder: video_encoder.to_string(),
            audio_encoder: audio_encoder.to_string(),
        }
    }
}

/// VP8+Opus, VP9+Opus, generic WebM, then MP4.
pub fn default_candidates() -> Vec<CodecCandidate> {
    vec![
        CodecCandidate::new("video/webm;codecs=vp8,opus", Container::Webm, "libvpx", "libopus"),
        CodecCandidate::new("video/webm;codecs=vp9,opus", Container::Webm, "libvpx-vp9", "libopus"),
        CodecCandidate::new("video/webm", Container::Webm, "libvpx", "libvorbis"),
        CodecCandidate::new("video/mp4", Container::Mp4, "libx264", "aac"),
    ]
}

/// Which encoders the runtime provides.
pub trait CodecSupport: Send + Sync {
    fn has_encoder(&self, name: &str) -> bool;
}

/// Encoder names reported by `ffmpeg -encoders`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FfmpegCodecSupport {
    names: HashSet<String>,
}

impl FfmpegCodecSupport {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the table printed by `ffmpeg -encoders`.
    ///
    /// Rows after the ` ------` separator look like
    /// ` V....D libvpx               libvpx VP8 (codec vp8)`.
    pub fn parse(output: &str) -> Self {
        let names = output
            .lines()
            .skip_while(|line| !line.trim_start().starts_with("------"))
            .skip(1)
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let flags = parts.next()?;
                let name = parts.next()?;
                (flags.len() == 6).then(|| name.to_string())
            })
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl CodecSupport for FfmpegCodecSupport {
    fn has_encoder(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// First candidate whose encoders are all available.
///
/// The audio encoder is only required when the source has audio.
pub fn negotiate(
    candidates: &[CodecCandidate],
    support: &dyn CodecSupport,
    needs_audio: bool,
) -> Result<CodecCandidate, WatermarkError> {
    candidates
        .iter()
        .find(|c| {
            support.has_encoder(&c.video_encoder)
                && (!needs_audio || support.has_encoder(&c.audio_encoder))
        })
        .cloned()
        .ok_or_else(|| WatermarkError::UnsupportedCodec {
            attempted: candidates.iter().map(|c| c.label.clone()).collect(),
        })
}

/// Run `ffmpeg -encoders` and parse the result.
pub async fn query_encoders(ffmpeg: &Path) -> Result<FfmpegCodecSupport, WatermarkError> {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| WatermarkError::EncodingSession(format!("Failed to run ffmpeg: {}", e)))?;

    if !output.status.success() {
        return Err(WatermarkError::EncodingSession(format!(
            "ffmpeg -encoders failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(FfmpegCodecSupport::parse(&String::from_utf8_lossy(&output.stdout)))
}
