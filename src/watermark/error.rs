//! Watermark error types.
//!
//! Every variant is fatal to the render call that produced it. Reverse
//! geocoding failures never appear here; they are recovered with a
//! coordinate fallback while resolving the location label.

use std::fmt;

/// Errors that can occur while producing a watermarked artifact.
#[derive(Debug)]
pub enum WatermarkError {
    /// Source image or video could not be read or decoded
    SourceLoad(String),

    /// Brand logo could not be read or decoded
    LogoLoad(String),

    /// No candidate container/codec pair is available
    UnsupportedCodec { attempted: Vec<String> },

    /// Encoder failed while recording; partial output was discarded
    EncodingSession(String),

    /// Overlay drawing or still image encoding failed
    Render(String),

    /// Invalid watermark spec or configuration
    Config(String),
}

impl WatermarkError {
    /// Short machine readable name, used in CLI output and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceLoad(_) => "source_load",
            Self::LogoLoad(_) => "logo_load",
            Self::UnsupportedCodec { .. } => "unsupported_codec",
            Self::EncodingSession(_) => "encoding_session",
            Self::Render(_) => "render",
            Self::Config(_) => "config",
        }
    }
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceLoad(msg) => write!(f, "Failed to load source media: {}", msg),
            Self::LogoLoad(msg) => write!(f, "Failed to load logo: {}", msg),
            Self::UnsupportedCodec { attempted } => write!(
                f,
                "No supported codec found (attempted: {})",
                attempted.join(", ")
            ),
            Self::EncodingSession(msg) => write!(f, "Encoding session failed: {}", msg),
            Self::Render(msg) => write!(f, "Failed to render watermark: {}", msg),
            Self::Config(msg) => write!(f, "Watermark configuration error: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}
