//! Still image encoding.
//!
//! Watermarked stills are finalized as JPEG. The result is self-contained
//! and can be embedded directly through [`EncodedImage::to_data_uri`].

use super::WatermarkError;
use base64::Engine as _;
use image::buffer::ConvertBuffer;
use image::{RgbImage, RgbaImage};

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Result of encoding a watermarked still.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:image/jpeg;base64,...`
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// Encodes a finished canvas.
pub trait ImageEncoder: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn encode(&self, canvas: &RgbaImage) -> Result<EncodedImage, WatermarkError>;
}

/// JPEG encoder using the image crate.
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageEncoder for JpegEncoder {
    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn encode(&self, canvas: &RgbaImage) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
        use image::{ColorType, ImageEncoder as _};

        // JPEG has no alpha channel
        let rgb: RgbImage = canvas.convert();

        let mut data = Vec::new();
        ImageJpegEncoder::new_with_quality(&mut data, self.quality)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| WatermarkError::Render(format!("JPEG encoding failed: {}", e)))?;

        Ok(EncodedImage {
            data,
            content_type: self.content_type(),
            width: canvas.width(),
            height: canvas.height(),
        })
    }
}
