use std::io::Cursor;

use image::DynamicImage;

use crate::error::Result;

/// Decode uploaded bytes into an image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Encode an image as PNG bytes for download by the caller.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn png_bytes_round_trip() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 3, Luma([77])));
        let bytes = encode_png(&img).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!((back.width(), back.height()), (4, 3));
        assert_eq!(back.to_luma8().get_pixel(2, 1)[0], 77);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(decode(b"not an image").is_err());
    }
}
