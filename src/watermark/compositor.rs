//! Pixel compositing primitives.
//!
//! Alpha blending of RGBA layers onto a canvas, plus fitting the brand logo
//! into its layout box. Resizing goes through `fast_image_resize`.

use super::layout::LogoBox;
use super::WatermarkError;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::{Rgba, RgbaImage};
use std::num::NonZeroU32;

/// Blend two pixels using alpha compositing with additional opacity.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);
    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Blend `layer` onto `target` with its top-left corner at (`x`, `y`).
///
/// Parts of the layer outside the target are clipped.
pub fn blend_layer(target: &mut RgbaImage, layer: &RgbaImage, x: i32, y: i32, opacity: f32) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + layer.width() as i32).min(target_width);
    let y_end = (y + layer.height() as i32).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = *layer.get_pixel((tx - x) as u32, (ty - y) as u32);
            let dst = *target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixels(dst, src, opacity));
        }
    }
}

/// Resize an RGBA image to exactly `width` x `height`.
pub fn resize_rgba(src: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, WatermarkError> {
    if src.width() == width && src.height() == height {
        return Ok(src.clone());
    }

    let non_zero = |v: u32, what: &str| {
        NonZeroU32::new(v).ok_or_else(|| WatermarkError::Render(format!("{} is 0", what)))
    };
    let src_width = non_zero(src.width(), "Source width")?;
    let src_height = non_zero(src.height(), "Source height")?;
    let dst_width = non_zero(width, "Target width")?;
    let dst_height = non_zero(height, "Target height")?;

    let src_image = Image::from_vec_u8(src_width, src_height, src.as_raw().clone(), PixelType::U8x4)
        .map_err(|e| WatermarkError::Render(format!("Failed to create source image: {:?}", e)))?;
    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Bilinear));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| WatermarkError::Render(format!("Resize operation failed: {:?}", e)))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| WatermarkError::Render("Failed to create resized image buffer".to_string()))
}

/// Fit `logo` into a `size` square, preserving aspect ratio.
pub fn fit_logo(logo: &RgbaImage, size: u32) -> Result<RgbaImage, WatermarkError> {
    if logo.width() == 0 || logo.height() == 0 {
        return Err(WatermarkError::Render("Logo has no pixels".to_string()));
    }
    let size = size.max(1);
    let ratio = (size as f32 / logo.width() as f32).min(size as f32 / logo.height() as f32);
    let width = ((logo.width() as f32 * ratio).round() as u32).clamp(1, size);
    let height = ((logo.height() as f32 * ratio).round() as u32).clamp(1, size);
    resize_rgba(logo, width, height)
}

/// Draw `logo` centred in `slot`. The logo is resized unless it already fits.
pub fn draw_logo(
    canvas: &mut RgbaImage,
    logo: &RgbaImage,
    slot: LogoBox,
    opacity: f32,
) -> Result<(), WatermarkError> {
    let fits = logo.width().max(logo.height()) == slot.size
        && logo.width() <= slot.size
        && logo.height() <= slot.size;
    let fitted;
    let logo = if fits {
        logo
    } else {
        fitted = fit_logo(logo, slot.size)?;
        &fitted
    };

    let x = slot.x + (slot.size as i32 - logo.width() as i32) / 2;
    let y = slot.y + (slot.size as i32 - logo.height() as i32) / 2;
    blend_layer(canvas, logo, x, y, opacity);
    Ok(())
}
