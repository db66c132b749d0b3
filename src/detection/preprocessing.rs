use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{bilateral_filter, gaussian_blur_f32, separable_filter};

use crate::params::{Blur, ClaheConfig, GrayscaleMode, LinearAdjust, NormalizeConfig};

/// Convert image to grayscale via the fixed luma weighting.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Brightness channel of the hue/saturation/value decomposition.
pub fn value_channel(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let p = rgb.get_pixel(x, y);
        Luma([p[0].max(p[1]).max(p[2])])
    })
}

/// Power-law intensity remap through a precomputed 256-entry lookup table:
/// `out = ((in / 255) ^ (1 / gamma)) * 255`.
pub fn gamma_correct(img: &GrayImage, gamma: f32) -> GrayImage {
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let normalized = i as f32 / 255.0;
        *entry = (normalized.powf(1.0 / gamma) * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([lut[img.get_pixel(x, y)[0] as usize]])
    })
}

/// Contrast-limited adaptive histogram equalization.
///
/// Each tile's histogram is clipped at `clip_limit` times the uniform bin
/// count, the clipped mass is redistributed evenly, and per-tile equalization
/// mappings are blended bilinearly between tile centers to hide seams.
pub fn clahe(img: &GrayImage, cfg: &ClaheConfig) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let tile_w = w.div_ceil(cfg.tile_grid.max(1));
    let tile_h = h.div_ceil(cfg.tile_grid.max(1));
    let tiles_x = w.div_ceil(tile_w) as usize;
    let tiles_y = h.div_ceil(tile_h) as usize;

    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y as u32 {
        for tx in 0..tiles_x as u32 {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let count = (x1 - x0) * (y1 - y0);
            clip_histogram(&mut hist, cfg.clip_limit, count);

            let lut = &mut luts[ty as usize * tiles_x + tx as usize];
            let mut cdf = 0u32;
            for (value, bin) in hist.iter().enumerate() {
                cdf += bin;
                lut[value] = (cdf as f32 / count as f32 * 255.0).round() as u8;
            }
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let v = img.get_pixel(x, y)[0] as usize;
        let (ix0, ix1, wx) = tile_coords(x, tile_w, tiles_x);
        let (iy0, iy1, wy) = tile_coords(y, tile_h, tiles_y);
        let top = luts[iy0 * tiles_x + ix0][v] as f32 * (1.0 - wx)
            + luts[iy0 * tiles_x + ix1][v] as f32 * wx;
        let bottom = luts[iy1 * tiles_x + ix0][v] as f32 * (1.0 - wx)
            + luts[iy1 * tiles_x + ix1][v] as f32 * wx;
        Luma([(top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8])
    })
}

/// Clip histogram bins at the limit and spread the excess evenly.
fn clip_histogram(hist: &mut [u32; 256], clip_limit: f32, count: u32) {
    let limit = ((clip_limit * count as f32 / 256.0).max(1.0)) as u32;
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let share = excess / 256;
    let remainder = excess % 256;
    for (value, bin) in hist.iter_mut().enumerate() {
        *bin += share + u32::from((value as u32) < remainder);
    }
}

/// Neighbouring tile indices and the blend weight for a pixel coordinate,
/// measured against tile centers and clamped at the image border.
fn tile_coords(p: u32, tile: u32, tiles: usize) -> (usize, usize, f32) {
    let f = (p as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    if f >= (tiles - 1) as f32 {
        return (tiles - 1, tiles - 1, 0.0);
    }
    let i0 = f.floor() as usize;
    (i0, i0 + 1, f - f.floor())
}

/// Apply the configured smoothing variant.
pub fn apply_blur(img: &GrayImage, blur: &Blur) -> GrayImage {
    match *blur {
        Blur::Gaussian { sigma } => gaussian_blur_f32(img, sigma),
        Blur::Directional { width, height } => {
            let h_kernel = box_kernel(width);
            let v_kernel = box_kernel(height);
            separable_filter(img, &h_kernel, &v_kernel)
        }
        Blur::Bilateral { window, sigma_color, sigma_spatial } => {
            bilateral_filter(img, window, sigma_color, sigma_spatial)
        }
    }
}

fn box_kernel(len: u32) -> Vec<f32> {
    vec![1.0 / len as f32; len as usize]
}

/// Global linear remap: `clamp(alpha * value + beta, 0, 255)`.
pub fn linear_adjust(img: &GrayImage, adj: &LinearAdjust) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img.get_pixel(x, y)[0] as f32;
        Luma([(adj.alpha * v + adj.beta).round().clamp(0.0, 255.0) as u8])
    })
}

/// Run the enabled stages in their fixed order: grayscale reduction, gamma,
/// adaptive equalization, blur, linear adjustment.
pub fn normalize(img: &DynamicImage, cfg: &NormalizeConfig) -> GrayImage {
    let mut gray = match cfg.grayscale {
        GrayscaleMode::Luma => to_grayscale(img),
        GrayscaleMode::Value => value_channel(img),
    };
    if let Some(gamma) = cfg.gamma {
        gray = gamma_correct(&gray, gamma);
    }
    if let Some(clahe_cfg) = &cfg.clahe {
        gray = clahe(&gray, clahe_cfg);
    }
    if let Some(blur) = &cfg.blur {
        gray = apply_blur(&gray, blur);
    }
    if let Some(adj) = &cfg.linear {
        gray = linear_adjust(&gray, adj);
    }
    gray
}
