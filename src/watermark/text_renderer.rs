//! Text rendering for overlay lines.
//!
//! Glyphs are rasterised with `ab_glyph` and alpha-composited directly onto
//! the target canvas, optionally preceded by an offset drop shadow.
//!
//! # Features
//!
//! - Hex color parsing (#RGB and #RRGGBB formats)
//! - Regular and bold weights from embedded DejaVu Sans faces
//! - Kerning-aware measurement
//!
//! # Example
//!
//! ```ignore
//! use sourceable::watermark::text_renderer::{draw_text, parse_hex_color, TextRenderOptions};
//!
//! let options = TextRenderOptions {
//!     text: "sourceable.app/verify/abc123".to_string(),
//!     font_size: 18.0,
//!     color: parse_hex_color("#FFFFFF").unwrap(),
//!     opacity: 0.6,
//!     ..Default::default()
//! };
//! draw_text(&mut canvas, &options, 40, 900)?;
//! ```

use super::compositor::blend_pixels;
use super::layout::FontWeight;
use super::WatermarkError;
use ab_glyph::{Font, FontRef, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::sync::OnceLock;

static REGULAR_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();
static BOLD_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();

const REGULAR_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");
const BOLD_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans-Bold.ttf");

/// Embedded font for `weight`, parsed on first use.
pub fn font(weight: FontWeight) -> Result<&'static FontRef<'static>, WatermarkError> {
    let (cell, data) = match weight {
        FontWeight::Regular => (&REGULAR_FONT, REGULAR_FONT_DATA),
        FontWeight::Bold => (&BOLD_FONT, BOLD_FONT_DATA),
    };

    cell.get_or_init(|| FontRef::try_from_slice(data).ok())
        .as_ref()
        .ok_or_else(|| WatermarkError::Render(format!("Embedded {:?} font is invalid", weight)))
}

/// RGB color parsed from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

/// Offset shadow drawn beneath a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextShadow {
    pub color: Color,
    /// Offset in pixels, applied to both axes.
    pub offset: f32,
}

#[derive(Debug, Clone)]
pub struct TextRenderOptions {
    pub text: String,
    /// Font size in pixels.
    pub font_size: f32,
    pub weight: FontWeight,
    pub color: Color,
    /// Opacity (0.0 to 1.0), applied to text and shadow alike.
    pub opacity: f32,
    pub shadow: Option<TextShadow>,
}

impl Default for TextRenderOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 24.0,
            weight: FontWeight::Regular,
            color: Color::white(),
            opacity: 0.6,
            shadow: None,
        }
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::Config("Color must start with '#'".to_string()))?;

    if !hex.is_ascii() {
        return Err(WatermarkError::Config(format!("Invalid color '#{}'", hex)));
    }

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::Config(format!("Invalid hex digit in '#{}'", hex)))
    };

    match hex.len() {
        3 => Ok(Color::new(
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(WatermarkError::Config(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

/// Width and height in pixels of `text` set at `font_size`.
pub fn measure_text(text: &str, font_size: f32, weight: FontWeight) -> Result<(u32, u32), WatermarkError> {
    let font = font(weight)?;
    let scaled = font.as_scaled(PxScale::from(font_size));

    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }

    Ok((width.ceil().max(0.0) as u32, scaled.height().ceil() as u32))
}

/// Ascent-to-descent height of a line set at `font_size`.
pub fn glyph_height(font_size: f32, weight: FontWeight) -> Result<f32, WatermarkError> {
    Ok(font(weight)?.as_scaled(PxScale::from(font_size)).height())
}

/// Draw a text run with its glyph box top-left at (`x`, `top`).
///
/// Pixels outside the canvas are clipped.
pub fn draw_text(
    canvas: &mut RgbaImage,
    options: &TextRenderOptions,
    x: i32,
    top: i32,
) -> Result<(), WatermarkError> {
    if options.text.is_empty() || options.font_size <= 0.0 {
        return Ok(());
    }

    let font = font(options.weight)?;
    let opacity = options.opacity.clamp(0.0, 1.0);

    if let Some(shadow) = options.shadow {
        let dx = x as f32 + shadow.offset;
        let dy = top as f32 + shadow.offset;
        draw_glyphs(canvas, font, options, dx, dy, shadow.color, opacity);
    }
    draw_glyphs(canvas, font, options, x as f32, top as f32, options.color, opacity);

    Ok(())
}

fn draw_glyphs(
    canvas: &mut RgbaImage,
    font: &FontRef<'static>,
    options: &TextRenderOptions,
    x: f32,
    top: f32,
    color: Color,
    opacity: f32,
) {
    let scale = PxScale::from(options.font_size);
    let scaled = font.as_scaled(scale);
    let baseline = top + scaled.ascent();
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);

    let mut cursor_x = x;
    let mut prev: Option<GlyphId> = None;

    for c in options.text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, id);
        }

        let glyph = id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let tx = px as i32 + bounds.min.x as i32;
                let ty = py as i32 + bounds.min.y as i32;
                if tx >= 0 && ty >= 0 && tx < width && ty < height {
                    let alpha = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                    let existing = *canvas.get_pixel(tx as u32, ty as u32);
                    let blended = blend_pixels(existing, color.with_alpha(alpha), opacity);
                    canvas.put_pixel(tx as u32, ty as u32, blended);
                }
            });
        }

        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }
}
