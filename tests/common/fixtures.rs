use image::{DynamicImage, GrayImage, Luma};

/// Flat gray canvas with dark horizontal bands centered on the given rows.
pub fn banded_image(
    width: u32,
    height: u32,
    centers: &[u32],
    half: u32,
    background: u8,
    depth: u8,
) -> DynamicImage {
    let img = GrayImage::from_fn(width, height, |_, y| {
        let in_band = centers.iter().any(|&c| y.abs_diff(c) <= half);
        Luma([if in_band { background - depth } else { background }])
    });
    DynamicImage::ImageLuma8(img)
}

/// Black canvas with solid white squares at the given top-left corners.
pub fn blocks_image(width: u32, height: u32, corners: &[(u32, u32)], size: u32) -> DynamicImage {
    let img = GrayImage::from_fn(width, height, |x, y| {
        let inside = corners
            .iter()
            .any(|&(cx, cy)| x >= cx && x < cx + size && y >= cy && y < cy + size);
        Luma([if inside { 255 } else { 0 }])
    });
    DynamicImage::ImageLuma8(img)
}

/// Uniform canvas of one intensity.
pub fn flat_image(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
}
