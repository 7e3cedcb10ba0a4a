//! Working resolution for video re-encoding.

use serde::{Deserialize, Serialize};

/// Bounding box for the recording canvas, orientation independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionCap {
    pub long_edge: u32,
    pub short_edge: u32,
}

impl Default for ResolutionCap {
    fn default() -> Self {
        Self {
            long_edge: 800,
            short_edge: 600,
        }
    }
}

impl ResolutionCap {
    /// (max width, max height) for a source of the given shape.
    pub fn bounds_for(&self, width: u32, height: u32) -> (u32, u32) {
        if height > width {
            (self.short_edge, self.long_edge)
        } else {
            (self.long_edge, self.short_edge)
        }
    }
}

/// Largest even value not above `v`, and never below 2.
fn even(v: u32) -> u32 {
    (v & !1).max(2)
}

/// Scale `width` x `height` down (never up) to fit `cap`, keeping the
/// aspect ratio. Dimensions are rounded down to even numbers for 4:2:0
/// chroma subsampling, with a floor of 2 pixels per side.
pub fn working_resolution(width: u32, height: u32, cap: ResolutionCap) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let (max_w, max_h) = cap.bounds_for(width, height);
    let (w64, h64) = (width as u64, height as u64);
    let (max_w, max_h) = (max_w as u64, max_h as u64);

    let (w, h) = if w64 <= max_w && h64 <= max_h {
        (w64, h64)
    } else if w64 * max_h >= h64 * max_w {
        (max_w, h64 * max_w / w64)
    } else {
        (w64 * max_h / h64, max_h)
    };

    (even(w as u32), even(h as u32))
}
