//! The shared overlay routine.
//!
//! [`render_overlay`] is used for still images and for every frame of a
//! video alike. It knows nothing about where the canvas came from.

use super::compositor::{draw_logo, fit_logo};
use super::layout::{compute_layout, OverlayContent, OverlayLayout};
use super::text_renderer::{
    draw_text, glyph_height, parse_hex_color, Color, TextRenderOptions, TextShadow,
};
use super::WatermarkError;
use crate::config::BrandingConfig;
use image::RgbaImage;

/// Shadow offset relative to font size.
const SHADOW_OFFSET_RATIO: f32 = 0.08;

/// Colors and opacity shared by every overlay element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub text_color: Color,
    pub shadow_color: Color,
    pub opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            text_color: Color::white(),
            shadow_color: Color::black(),
            opacity: 0.6,
        }
    }
}

impl OverlayStyle {
    pub fn from_config(branding: &BrandingConfig) -> Result<Self, WatermarkError> {
        Ok(Self {
            text_color: parse_hex_color(&branding.text_color)?,
            shadow_color: parse_hex_color(&branding.shadow_color)?,
            opacity: branding.opacity.clamp(0.0, 1.0),
        })
    }
}

/// Lay out and draw the overlay onto `canvas`.
///
/// Returns the layout that was drawn.
pub fn render_overlay(
    canvas: &mut RgbaImage,
    logo: &RgbaImage,
    content: &OverlayContent,
    style: &OverlayStyle,
) -> Result<OverlayLayout, WatermarkError> {
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(WatermarkError::Render(format!(
            "Cannot draw overlay on a {}x{} canvas",
            canvas.width(),
            canvas.height()
        )));
    }

    let layout = compute_layout(canvas.width(), canvas.height(), content);
    draw_layout(canvas, logo, &layout, style)?;
    Ok(layout)
}

/// Draw a precomputed layout. Frames of one video share a single layout.
pub fn draw_layout(
    canvas: &mut RgbaImage,
    logo: &RgbaImage,
    layout: &OverlayLayout,
    style: &OverlayStyle,
) -> Result<(), WatermarkError> {
    draw_logo(canvas, logo, layout.logo, style.opacity)?;

    for line in &layout.lines {
        let options = TextRenderOptions {
            text: line.text.clone(),
            font_size: line.font_size,
            weight: line.weight,
            color: style.text_color,
            opacity: style.opacity,
            shadow: Some(TextShadow {
                color: style.shadow_color,
                offset: (line.font_size * SHADOW_OFFSET_RATIO).max(1.0),
            }),
        };
        // Centre the glyph box inside the line box.
        let text_height = glyph_height(line.font_size, line.weight)?;
        let top = line.top + ((line.line_height - text_height) / 2.0).round() as i32;
        draw_text(canvas, &options, line.x, top)?;
    }

    Ok(())
}

/// Logo resized once for `layout`, so per-frame drawing skips the resize.
pub fn prepare_logo(logo: &RgbaImage, layout: &OverlayLayout) -> Result<RgbaImage, WatermarkError> {
    fit_logo(logo, layout.logo.size)
}
