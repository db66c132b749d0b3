use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::{close, dilate, open};

use crate::models::Contour;
use crate::params::{Binarize, ContourParams};

/// Intermediate images and retained contours of one contour-detection pass.
#[derive(Debug)]
pub struct ContourStages {
    /// Cleaned binary foreground mask.
    pub mask: GrayImage,
    /// Closed and thickened edge map the contours were traced from.
    pub edges: GrayImage,
    pub contours: Vec<Contour>,
}

/// Binary foreground mask for the configured thresholding mode.
pub fn binarize(gray: &GrayImage, mode: &Binarize) -> GrayImage {
    match *mode {
        Binarize::Global { threshold: t } => global_threshold(gray, t),
        Binarize::Adaptive { block_radius, offset } => {
            adaptive_mean_threshold(gray, block_radius, offset)
        }
    }
}

// Pixels at or above `t` become foreground; imageproc's Binary mode keeps
// strictly-greater pixels, so the threshold is shifted down by one.
fn global_threshold(gray: &GrayImage, t: u8) -> GrayImage {
    if t == 0 {
        return GrayImage::from_pixel(gray.width(), gray.height(), Luma([255]));
    }
    threshold(gray, t - 1, ThresholdType::Binary)
}

/// Per-pixel threshold from the local window mean minus `offset`, computed
/// over a `(2r+1)^2` window via an integral image. Compensates for uneven
/// illumination where a global threshold over- or under-selects.
pub fn adaptive_mean_threshold(gray: &GrayImage, block_radius: u32, offset: i16) -> GrayImage {
    let (w, h) = gray.dimensions();
    let stride = w as usize + 1;
    let mut integral = vec![0u64; stride * (h as usize + 1)];
    for y in 0..h as usize {
        let mut row_sum = 0u64;
        for x in 0..w as usize {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
    let r = block_radius as i64;
    GrayImage::from_fn(w, h, |x, y| {
        let x0 = (x as i64 - r).max(0) as usize;
        let y0 = (y as i64 - r).max(0) as usize;
        let x1 = (x as i64 + r + 1).min(w as i64) as usize;
        let y1 = (y as i64 + r + 1).min(h as i64) as usize;
        let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
            - integral[y0 * stride + x1]
            - integral[y1 * stride + x0];
        let mean = (sum / ((x1 - x0) * (y1 - y0)) as u64) as i32;
        let keep = gray.get_pixel(x, y)[0] as i32 >= mean - offset as i32;
        Luma([if keep { 255 } else { 0 }])
    })
}

/// Run binarize, opening, Canny, closing plus dilation, boundary tracing, and
/// the minimum-area filter.
pub fn detect(gray: &GrayImage, params: &ContourParams) -> ContourStages {
    let mask = binarize(gray, &params.binarize);
    let mask = open(&mask, Norm::LInf, kernel_radius(params.open_kernel));

    let mut edges = canny(&mask, params.edge_low, params.edge_high);
    let k = kernel_radius(params.close_kernel);
    for _ in 0..params.close_iterations {
        edges = close(&edges, Norm::LInf, k);
    }
    let edges = dilate(&edges, Norm::LInf, k);

    let mut contours = trace_external(&edges);
    contours.retain(|c| c.area() >= params.min_area);
    if params.largest_only {
        contours = contours
            .into_iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()))
            .into_iter()
            .collect();
    }

    ContourStages { mask, edges, contours }
}

// Structuring element side length to the half-width imageproc expects.
fn kernel_radius(size: u32) -> u8 {
    (size.saturating_sub(1) / 2).min(u8::MAX as u32) as u8
}

/// Outermost boundary loops of the edge map; nested contours are discarded,
/// which undercounts objects with holes but suits opaque solid objects.
fn trace_external(edges: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .map(|c| Contour { points: c.points })
        .collect()
}
