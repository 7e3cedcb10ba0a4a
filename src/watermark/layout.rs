//! Overlay layout computation.
//!
//! The overlay is a left-aligned block stacked bottom-up from the lower
//! edge of the canvas:
//!
//! ```text
//!   sourceable.app/verify/abc123        <- verification URL (regular)
//!   [logo] Sourceable                   <- brand row
//!   Bandra West, Mumbai                 <- location (bold)
//!   approx. 19.08°N, 72.88°E            <- caption, radius tiers only
//!   March 5, 2024, 02:03:04 PM +05:30   <- timestamp (bold)
//! ```
//!
//! Every metric is a fraction of the canvas width, so a 100px thumbnail and
//! a 4000px original carry the same visual language. When the width-derived
//! stack would be taller than [`MAX_OVERLAY_FRACTION`] of the shorter canvas
//! side, all metrics are scaled down uniformly.
//!
//! Each line box keeps at least one pixel of height so the bottom-up order
//! survives on tiny canvases. The cap is therefore met only when the shorter
//! side leaves room for one pixel per line; below that the stack is as small
//! as the floor allows.
//!
//! Layout is pure: the same `(width, height, content)` always yields the
//! same positions.

use super::label::LocationText;
use super::spec::{display_url, WatermarkSpec};

/// Upper bound on stack height as a fraction of `min(width, height)`.
pub const MAX_OVERLAY_FRACTION: f32 = 0.35;

/// Line box height relative to font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.4;

/// Size fractions, all relative to canvas width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub inset: f32,
    pub base_unit: f32,
    pub bottom_pad_units: f32,
    pub timestamp_font: f32,
    pub caption_font: f32,
    pub location_font: f32,
    pub logo_size: f32,
    /// Wordmark font size relative to the logo box.
    pub wordmark_ratio: f32,
    /// Gap between logo and wordmark relative to the logo box.
    pub wordmark_gap_ratio: f32,
    pub url_font: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            inset: 0.04,
            base_unit: 0.02,
            bottom_pad_units: 1.5,
            timestamp_font: 0.022,
            caption_font: 0.018,
            location_font: 0.03,
            logo_size: 0.06,
            wordmark_ratio: 0.8,
            wordmark_gap_ratio: 0.25,
            url_font: 0.018,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineRole {
    Timestamp,
    Caption,
    Location,
    Wordmark,
    VerificationUrl,
}

/// Text shown by the overlay, already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayContent {
    /// Scheme-stripped verification URL.
    pub url: String,
    pub wordmark: String,
    pub timestamp: String,
    pub location: Option<String>,
    pub caption: Option<String>,
}

impl OverlayContent {
    pub fn from_spec(spec: &WatermarkSpec, location: &LocationText) -> Self {
        let non_empty = |s: &Option<String>| s.as_ref().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            url: display_url(&spec.verification_url).to_string(),
            wordmark: spec.wordmark.clone(),
            timestamp: spec.timestamp.clone(),
            location: non_empty(&location.primary),
            caption: non_empty(&location.caption),
        }
    }
}

/// One positioned text run. `top` is the top of the line box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub role: LineRole,
    pub text: String,
    pub x: i32,
    pub top: i32,
    pub font_size: f32,
    pub line_height: f32,
    pub weight: FontWeight,
}

/// Square box the logo is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoBox {
    pub x: i32,
    pub y: i32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Uniform shrink factor applied to satisfy the area cap.
    pub scale: f32,
    pub lines: Vec<TextLine>,
    pub logo: LogoBox,
    /// Top of the brand row (logo and wordmark).
    pub brand_top: i32,
    /// Top of the whole stack.
    pub top: i32,
}

impl OverlayLayout {
    pub fn line(&self, role: LineRole) -> Option<&TextLine> {
        self.lines.iter().find(|l| l.role == role)
    }

    /// Distance from the top of the stack to the bottom edge of the canvas.
    pub fn stack_height(&self) -> i32 {
        self.canvas_height as i32 - self.top
    }
}

/// Line box height, floored at one pixel.
fn advance(font_size: f32) -> f32 {
    (font_size * LINE_HEIGHT_FACTOR).max(1.0)
}

/// Stack height for a given scale, before rounding.
fn stack_extent(metrics: &LayoutMetrics, width: f32, scale: f32, content: &OverlayContent) -> f32 {
    let w = width * scale;
    let logo = (metrics.logo_size * w).max(1.0);
    let mut total = metrics.base_unit * w * metrics.bottom_pad_units;
    total += advance(metrics.timestamp_font * w);
    if content.caption.is_some() {
        total += advance(metrics.caption_font * w);
    }
    if content.location.is_some() {
        total += advance(metrics.location_font * w);
    }
    total += logo.max(advance(logo * metrics.wordmark_ratio));
    total += advance(metrics.url_font * w);
    total
}

/// Largest scale in (0, 1] whose stack fits within `cap`.
///
/// The extent is monotonic in scale but not linear once line floors apply,
/// so the scale is found by bisection. When not even the floors fit, the
/// linear estimate is used.
fn fit_scale(metrics: &LayoutMetrics, width: f32, cap: f32, content: &OverlayContent) -> f32 {
    let natural = stack_extent(metrics, width, 1.0, content);
    if natural <= cap || natural <= 0.0 {
        return 1.0;
    }

    let linear = cap / natural;
    if stack_extent(metrics, width, linear, content) <= cap {
        return linear;
    }
    if stack_extent(metrics, width, 0.0, content) > cap {
        return linear;
    }

    let (mut lo, mut hi) = (0.0f32, linear);
    for _ in 0..32 {
        let mid = (lo + hi) / 2.0;
        if stack_extent(metrics, width, mid, content) <= cap {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

pub fn compute_layout(width: u32, height: u32, content: &OverlayContent) -> OverlayLayout {
    compute_layout_with(&LayoutMetrics::default(), width, height, content)
}

pub fn compute_layout_with(
    metrics: &LayoutMetrics,
    width: u32,
    height: u32,
    content: &OverlayContent,
) -> OverlayLayout {
    let w = width as f32;
    let cap = MAX_OVERLAY_FRACTION * width.min(height) as f32;

    let scale = fit_scale(metrics, w, cap, content);
    let sw = w * scale;

    let x = (metrics.inset * w).round() as i32;
    let mut cursor = height as f32 - metrics.base_unit * sw * metrics.bottom_pad_units;
    let mut lines = Vec::with_capacity(5);

    let mut push_line = |cursor: &mut f32, role, text: &str, font_size: f32, weight| {
        let line_height = advance(font_size);
        *cursor -= line_height;
        lines.push(TextLine {
            role,
            text: text.to_string(),
            x,
            top: cursor.floor() as i32,
            font_size,
            line_height,
            weight,
        });
    };

    push_line(
        &mut cursor,
        LineRole::Timestamp,
        &content.timestamp,
        metrics.timestamp_font * sw,
        FontWeight::Bold,
    );
    if let Some(caption) = &content.caption {
        push_line(
            &mut cursor,
            LineRole::Caption,
            caption,
            metrics.caption_font * sw,
            FontWeight::Regular,
        );
    }
    if let Some(location) = &content.location {
        push_line(
            &mut cursor,
            LineRole::Location,
            location,
            metrics.location_font * sw,
            FontWeight::Bold,
        );
    }

    // Brand row: logo centred on the row, wordmark to its right.
    let logo_size = (metrics.logo_size * sw).max(1.0);
    let wordmark_font = logo_size * metrics.wordmark_ratio;
    let wordmark_line = advance(wordmark_font);
    let row_height = logo_size.max(wordmark_line);
    cursor -= row_height;
    let brand_top = cursor.floor() as i32;
    let center = cursor + row_height / 2.0;
    let logo = LogoBox {
        x,
        y: (center - logo_size / 2.0).floor() as i32,
        size: logo_size.round().max(1.0) as u32,
    };
    lines.push(TextLine {
        role: LineRole::Wordmark,
        text: content.wordmark.clone(),
        x: x + (logo_size * (1.0 + metrics.wordmark_gap_ratio)).round() as i32,
        top: (center - wordmark_line / 2.0).floor() as i32,
        font_size: wordmark_font,
        line_height: wordmark_line,
        weight: FontWeight::Bold,
    });

    let mut push_url = |cursor: &mut f32| {
        let font_size = metrics.url_font * sw;
        let line_height = advance(font_size);
        *cursor -= line_height;
        lines.push(TextLine {
            role: LineRole::VerificationUrl,
            text: content.url.clone(),
            x,
            top: cursor.floor() as i32,
            font_size,
            line_height,
            weight: FontWeight::Regular,
        });
    };
    push_url(&mut cursor);

    OverlayLayout {
        canvas_width: width,
        canvas_height: height,
        scale,
        lines,
        logo,
        brand_top,
        top: cursor.floor() as i32,
    }
}
