//! Still image path.
//!
//! Source and logo are loaded independently (their failures are distinct
//! error kinds), the location text is resolved, and the overlay is drawn
//! once onto a canvas at the source's natural resolution.

use super::asset_loader::{decode_image, MediaSource};
use super::encoder::EncodedImage;
use super::label::resolve_location;
use super::layout::OverlayContent;
use super::orientation;
use super::overlay::{render_overlay, OverlayStyle};
use super::processor::RenderContext;
use super::{WatermarkError, WatermarkSpec};
use image::{DynamicImage, RgbaImage};
use tracing::{debug, info};

/// Decode source bytes into an upright image.
pub fn decode_source(data: &[u8], extension: Option<&str>) -> Result<DynamicImage, WatermarkError> {
    let decoded =
        decode_image(data, extension).map_err(|e| WatermarkError::SourceLoad(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(WatermarkError::SourceLoad("image has no pixels".to_string()));
    }
    Ok(orientation::normalize(decoded, data))
}

/// Draw the source at (0, 0) on a same-sized canvas, then the overlay.
pub fn compose_still(
    source: &DynamicImage,
    logo: &RgbaImage,
    content: &OverlayContent,
    style: &OverlayStyle,
) -> Result<RgbaImage, WatermarkError> {
    let mut canvas = source.to_rgba8();
    render_overlay(&mut canvas, logo, content, style)?;
    Ok(canvas)
}

pub async fn process_image(
    ctx: &RenderContext,
    source: &MediaSource,
    spec: &WatermarkSpec,
) -> Result<EncodedImage, WatermarkError> {
    let data = ctx
        .loader
        .load_bytes(source)
        .await
        .map_err(|e| WatermarkError::SourceLoad(e.to_string()))?;
    let extension = source.extension();
    let image = decode_source(&data, extension.as_deref())?;
    debug!(
        source = %source.describe(),
        width = image.width(),
        height = image.height(),
        "Decoded still source"
    );

    let logo = ctx.loader.load_logo(&spec.logo).await?;

    let location = resolve_location(spec, ctx.geocoder.as_deref()).await;
    let content = OverlayContent::from_spec(spec, &location);

    let canvas = compose_still(&image, &logo, &content, &ctx.style)?;
    let encoded = ctx.encoder.encode(&canvas)?;

    info!(
        width = encoded.width,
        height = encoded.height,
        bytes = encoded.len(),
        precision = %spec.precision,
        "Watermarked still image"
    );
    Ok(encoded)
}
