use image::{GrayImage, RgbImage};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Rectangular region of interest in full-image coordinates.
///
/// Origins may be negative and extents may reach past the image; selection
/// clamps the rectangle to the image bounds before cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Axis-aligned rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Closed boundary traced around one detected object.
#[derive(Debug, Clone)]
pub struct Contour {
    /// Boundary points in trace order; the last point connects back to the first.
    pub points: Vec<Point<i32>>,
}

impl Contour {
    /// Enclosed area from the shoelace formula over the boundary points.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut doubled = 0i64;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            doubled += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
        }
        doubled.abs() as f64 / 2.0
    }

    /// Smallest axis-aligned rectangle containing every boundary point.
    pub fn bounding_box(&self) -> BoundingBox {
        let Some(first) = self.points.first() else {
            return BoundingBox { x: 0, y: 0, width: 0, height: 0 };
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        BoundingBox {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        }
    }
}

/// Averaged per-row intensity samples over a column band.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub samples: Vec<f32>,
}

impl Profile {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Flip the intensity scale so dark bands become maxima.
    pub fn inverted(&self) -> Profile {
        Profile {
            samples: self.samples.iter().map(|v| 255.0 - v).collect(),
        }
    }
}

/// Retained local maximum in a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Sample index; maps to a pixel row of the analyzed region.
    pub index: usize,
    /// Profile value at the peak.
    pub value: f32,
    /// Minimum descent to reach higher terrain on either side.
    pub prominence: f32,
    /// Extent of the peak at half-prominence height, in samples.
    pub width: f32,
}

/// Located features of one detection pass.
#[derive(Debug, Clone)]
pub enum Features {
    Contours(Vec<Contour>),
    Peaks {
        peaks: Vec<Peak>,
        /// Band-averaged intensity per row, before inversion.
        raw: Profile,
        /// The profile the peak search ran over: inverted intensity, or the
        /// gradient-magnitude profile when gradient emphasis is enabled.
        search: Profile,
    },
}

/// Intermediate stage images kept for operator display.
#[derive(Debug, Clone)]
pub struct Artifacts {
    /// Output of the photometric normalizer.
    pub normalized: GrayImage,
    /// Cleaned binary mask (contour path only).
    pub mask: Option<GrayImage>,
    /// Closed and thickened edge map (contour path only).
    pub edges: Option<GrayImage>,
}

/// Output contract of one detection pass. Constructed fresh per invocation.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Number of retained contours or peaks.
    pub count: u32,
    /// Presence flag; the decision output of the largest-single-object mode.
    pub found: bool,
    pub features: Features,
    /// Copy of the analyzed region with features drawn on it.
    pub annotated: RgbImage,
    pub artifacts: Artifacts,
}
