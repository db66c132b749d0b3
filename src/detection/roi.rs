use image::DynamicImage;

use crate::error::{DetectError, Result};
use crate::models::{BoundingBox, Region};

/// Clamp `roi` to an image of the given size. `None` when nothing remains.
pub fn clamp_to(width: u32, height: u32, roi: &Region) -> Option<BoundingBox> {
    let x1 = (roi.x as i64).max(0);
    let y1 = (roi.y as i64).max(0);
    let x2 = (roi.x as i64 + roi.width as i64).min(width as i64);
    let y2 = (roi.y as i64 + roi.height as i64).min(height as i64);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(BoundingBox {
        x: x1 as u32,
        y: y1 as u32,
        width: (x2 - x1) as u32,
        height: (y2 - y1) as u32,
    })
}

/// Crop `image` to `roi`, clamping the rectangle to the image bounds first.
/// Returns an independent copy; the source is left available for display.
pub fn select(image: &DynamicImage, roi: &Region) -> Result<DynamicImage> {
    let clamped = clamp_to(image.width(), image.height(), roi).ok_or(DetectError::InvalidRegion {
        width: image.width(),
        height: image.height(),
    })?;
    Ok(image.crop_imm(clamped.x, clamped.y, clamped.width, clamped.height))
}
