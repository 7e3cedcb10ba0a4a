//! Watermark compositing for verified captures.
//!
//! Every watermarked artifact carries the same overlay, anchored to the
//! bottom-left corner and stacked bottom-up:
//!
//! ```text
//! sourceable.app/verify/abc123        <- verification URL
//! [logo] Sourceable                   <- brand row
//! Within 5 mile radius                <- location (or place name)
//! approx. 19.08°N, 72.88°E            <- caption, radius tiers only
//! March 5, 2024, 02:30:00 PM +05:30   <- capture timestamp
//! ```
//!
//! The stack is sized from the canvas width and never exceeds
//! [`layout::MAX_OVERLAY_FRACTION`] of the shorter side. Stills keep their
//! natural resolution; videos are capped at a working resolution first.
//!
//! # Example
//!
//! ```ignore
//! use sourceable::geo::PrecisionTier;
//! use sourceable::watermark::{MediaSource, WatermarkCompositor, WatermarkSpec};
//!
//! let spec = WatermarkSpec::new(MediaSource::parse("logo.png")?, url, timestamp)
//!     .with_precision(PrecisionTier::Radius5)
//!     .with_gps(19.076, 72.8777);
//! let rendered = compositor.process(&MediaSource::parse("capture.mp4")?, &spec).await?;
//! ```

pub mod asset_loader;
pub mod compositor;
pub mod encoder;
pub mod error;
pub mod image_path;
pub mod label;
pub mod layout;
pub mod orientation;
pub mod overlay;
pub mod processor;
pub mod spec;
pub mod text_renderer;

pub use asset_loader::{
    AssetError, AssetLoader, AssetLoaderConfig, MediaKind, MediaSource, SourceCapabilities,
};
pub use encoder::{EncodedImage, ImageEncoder, JpegEncoder, DEFAULT_JPEG_QUALITY};
pub use error::WatermarkError;
pub use label::{radius_phrase, resolve_location, LocationText};
pub use layout::{
    compute_layout, LineRole, OverlayContent, OverlayLayout, MAX_OVERLAY_FRACTION,
};
pub use overlay::{render_overlay, OverlayStyle};
pub use processor::{RenderContext, RenderedMedia, WatermarkCompositor};
pub use spec::{display_url, verification_url, GpsCoordinates, WatermarkSpec, DEFAULT_WORDMARK};
pub use text_renderer::{parse_hex_color, Color};
