//! Video re-encoding configuration.

use serde::{Deserialize, Serialize};

use crate::video::codec::{default_candidates, CodecCandidate};

fn default_max_long_edge() -> u32 {
    800
}

fn default_max_short_edge() -> u32 {
    600
}

fn default_video_bitrate() -> u32 {
    1_000_000
}

fn default_audio_bitrate() -> u32 {
    128_000
}

fn default_fallback_fps() -> f64 {
    30.0
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoConfig {
    /// Longest side of the working resolution
    #[serde(default = "default_max_long_edge")]
    pub max_long_edge: u32,
    #[serde(default = "default_max_short_edge")]
    pub max_short_edge: u32,
    /// Constant video bitrate in bits per second
    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: u32,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: u32,
    /// Frame rate used when the source declares none
    #[serde(default = "default_fallback_fps")]
    pub fallback_fps: f64,
    /// Codec candidates in preference order
    #[serde(default = "default_candidates")]
    pub codecs: Vec<CodecCandidate>,
    /// ffmpeg binary name or path
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            max_long_edge: default_max_long_edge(),
            max_short_edge: default_max_short_edge(),
            video_bitrate: default_video_bitrate(),
            audio_bitrate: default_audio_bitrate(),
            fallback_fps: default_fallback_fps(),
            codecs: default_candidates(),
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

impl VideoConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_long_edge < 2 || self.max_short_edge < 2 {
            return Err("video resolution cap must be at least 2x2".to_string());
        }
        if self.max_short_edge > self.max_long_edge {
            return Err(format!(
                "video.max_short_edge ({}) exceeds max_long_edge ({})",
                self.max_short_edge, self.max_long_edge
            ));
        }
        if self.video_bitrate < 1000 || self.audio_bitrate < 1000 {
            return Err("video bitrates must be at least 1000 bps".to_string());
        }
        if !self.fallback_fps.is_finite() || self.fallback_fps <= 0.0 {
            return Err(format!(
                "video.fallback_fps must be positive, got {}",
                self.fallback_fps
            ));
        }
        if self.codecs.is_empty() {
            return Err("video.codecs must list at least one candidate".to_string());
        }
        Ok(())
    }
}
