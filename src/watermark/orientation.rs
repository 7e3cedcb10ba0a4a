//! EXIF orientation handling.
//!
//! Phone cameras store pixels in sensor order and record how the device was
//! held in the EXIF `Orientation` tag. The overlay must be drawn on the
//! upright image, so the tag is applied before compositing.

use image::DynamicImage;
use std::io::Cursor;

/// EXIF `Orientation` value (1..=8), if the container carries one.
pub fn read_orientation(data: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(data);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0).filter(|v| (1..=8).contains(v))
}

/// Rotate and/or mirror `image` so that orientation 1 (upright) results.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        // transpose
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        // transverse
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// Apply the orientation recorded in `data` to its decoded `image`.
pub fn normalize(image: DynamicImage, data: &[u8]) -> DynamicImage {
    match read_orientation(data) {
        Some(orientation) if orientation != 1 => {
            tracing::debug!(orientation, "Applying EXIF orientation");
            apply_orientation(image, orientation)
        }
        _ => image,
    }
}
