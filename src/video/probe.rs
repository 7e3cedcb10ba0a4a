//! FFprobe video metadata.

use crate::watermark::WatermarkError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Metadata needed before recording can start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Display width (after applying rotation).
    pub width: u32,
    /// Display height (after applying rotation).
    pub height: u32,
    /// Frames per second, if the stream declares it.
    pub fps: Option<f64>,
    /// Duration in seconds.
    pub duration: f64,
    pub audio_tracks: usize,
    /// Rotation in degrees recorded by the capture device.
    pub rotation: i32,
}

impl VideoMetadata {
    pub fn has_audio(&self) -> bool {
        self.audio_tracks > 0
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<f64>,
}

/// Parse frame rate string like "30/1" or "30000/1001".
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = match rate.split_once('/') {
        Some((num, den)) => (num.trim().parse::<f64>().ok()?, den.trim().parse::<f64>().ok()?),
        None => (rate.trim().parse::<f64>().ok()?, 1.0),
    };
    if den == 0.0 {
        return None;
    }
    let fps = num / den;
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Normalise a rotation to one of 0, 90, 180, 270.
fn normalize_rotation(degrees: f64) -> i32 {
    let quarter = (degrees / 90.0).round() as i32;
    quarter.rem_euclid(4) * 90
}

/// Build [`VideoMetadata`] from `ffprobe -print_format json` output.
pub fn parse_ffprobe_output(json: &[u8]) -> Result<VideoMetadata, WatermarkError> {
    let probe: FfprobeOutput = serde_json::from_slice(json)
        .map_err(|e| WatermarkError::SourceLoad(format!("Invalid ffprobe output: {}", e)))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| WatermarkError::SourceLoad("No video stream found".to_string()))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(WatermarkError::SourceLoad(
                "Video stream has no dimensions".to_string(),
            ))
        }
    };

    let rotation = video
        .side_data_list
        .iter()
        .find_map(|d| d.rotation)
        .or_else(|| video.tags.get("rotate").and_then(|r| r.parse::<f64>().ok()))
        .map(normalize_rotation)
        .unwrap_or(0);

    let (width, height) = if rotation % 180 == 0 {
        (width, height)
    } else {
        (height, width)
    };

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate));

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        width,
        height,
        fps,
        duration,
        audio_tracks: probe.streams.iter().filter(|s| s.codec_type == "audio").count(),
        rotation,
    })
}

/// Probe a video file with ffprobe.
pub async fn probe_video(ffprobe: &Path, input: &Path) -> Result<VideoMetadata, WatermarkError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| WatermarkError::SourceLoad(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(WatermarkError::SourceLoad(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_ffprobe_output(&output.stdout)
}
