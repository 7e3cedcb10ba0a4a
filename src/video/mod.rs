//! Video path.
//!
//! Sources are probed, decoded to RGBA at a capped working resolution,
//! overlaid frame by frame with the same routine the still path uses, and
//! re-encoded through the first codec the runtime supports.
//!
//! # Example
//!
//! ```ignore
//! let backend = Arc::new(FfmpegBackend::default());
//! let mut render = VideoRender::new(backend, VideoSettings::default());
//! let artifact = render.run(&ctx, &source, &spec, &PlaybackHandle::new()).await?;
//! artifact.persist("out.webm").await?;
//! ```

pub mod backend;
pub mod codec;
pub mod pipeline;
pub mod probe;
pub mod resolution;
pub mod session;
pub mod source;

pub use backend::{FfmpegBackend, MediaBackend};
pub use codec::{
    default_candidates, negotiate, CodecCandidate, CodecSupport, Container, FfmpegCodecSupport,
};
pub use pipeline::{effective_fps, VideoArtifact, VideoRender, VideoRenderState, VideoSettings};
pub use probe::{parse_ffprobe_output, VideoMetadata};
pub use resolution::{working_resolution, ResolutionCap};
pub use session::{EncodingSession, FfmpegEncodingSession, SessionParams};
pub use source::{FfmpegFrameSource, FrameSource, MaterializedInput, PlaybackHandle};
