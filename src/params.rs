use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};
use crate::models::Region;

/// Grayscale reduction applied before any other normalizer stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GrayscaleMode {
    /// Fixed luma weighting of the color channels.
    #[default]
    Luma,
    /// Brightness channel of the hue/saturation/value decomposition.
    Value,
}

/// Contrast-limited adaptive histogram equalization settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClaheConfig {
    /// Tiles per axis.
    pub tile_grid: u32,
    /// Histogram clip limit as a multiple of the uniform bin count.
    pub clip_limit: f32,
}

impl Default for ClaheConfig {
    fn default() -> Self {
        Self { tile_grid: 8, clip_limit: 2.0 }
    }
}

/// Noise-suppressing smoothing variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Blur {
    /// Isotropic Gaussian smoothing.
    Gaussian { sigma: f32 },
    /// Separable box smoothing with independent horizontal and vertical
    /// extents, e.g. wide horizontally and narrow vertically.
    Directional { width: u32, height: u32 },
    /// Edge-preserving smoothing controlled by spatial and intensity sigmas.
    Bilateral { window: u32, sigma_color: f32, sigma_spatial: f32 },
}

/// Global linear remap: `clamp(alpha * value + beta, 0, 255)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearAdjust {
    pub alpha: f32,
    pub beta: f32,
}

/// Photometric normalizer configuration.
///
/// Enabled stages always run in the same order: grayscale reduction, gamma,
/// adaptive equalization, blur, linear adjustment. The default configuration
/// enables nothing beyond luma reduction and leaves a grayscale input
/// untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizeConfig {
    pub grayscale: GrayscaleMode,
    /// Power-law remap exponent; values above 1 lift shadow detail.
    pub gamma: Option<f32>,
    pub clahe: Option<ClaheConfig>,
    pub blur: Option<Blur>,
    pub linear: Option<LinearAdjust>,
}

impl NormalizeConfig {
    pub fn with_grayscale(mut self, mode: GrayscaleMode) -> Self {
        self.grayscale = mode;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn with_clahe(mut self, clahe: ClaheConfig) -> Self {
        self.clahe = Some(clahe);
        self
    }

    pub fn with_blur(mut self, blur: Blur) -> Self {
        self.blur = Some(blur);
        self
    }

    pub fn with_linear(mut self, linear: LinearAdjust) -> Self {
        self.linear = Some(linear);
        self
    }
}

/// Binarization strategy for the contour path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Binarize {
    /// Fixed global threshold on the brightness channel; pixels at or above
    /// the threshold become foreground.
    Global { threshold: u8 },
    /// Per-pixel threshold from the local window mean minus `offset`,
    /// compensating for uneven illumination.
    Adaptive { block_radius: u32, offset: i16 },
}

/// Knobs of the contour detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourParams {
    pub binarize: Binarize,
    /// Canny hysteresis thresholds, low and high.
    pub edge_low: f32,
    pub edge_high: f32,
    /// Structuring element side for the noise-removing opening; odd, >= 3.
    pub open_kernel: u32,
    /// Structuring element side for gap closing; odd, >= 3.
    pub close_kernel: u32,
    pub close_iterations: u32,
    /// Minimum enclosed area for a contour to count.
    pub min_area: f64,
    /// Keep only the single maximum-area contour and report presence.
    pub largest_only: bool,
}

/// Column band placement for profile sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandConfig {
    /// One centered band, or two bands straddling the center to avoid an
    /// on-camera flash hot-spot.
    pub count: u32,
    /// Band width in columns.
    pub width: u32,
    /// Horizontal distance of each band from the image midline (two-band only).
    pub offset: u32,
}

/// Knobs of the profile peak detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakParams {
    /// Sample a vertical gradient-magnitude image instead of raw intensity.
    pub gradient: bool,
    pub bands: BandConfig,
    /// Minimum sample separation between retained peaks.
    pub min_distance: usize,
    /// Minimum prominence for a candidate to be retained.
    pub min_prominence: f32,
    /// Minimum extent at half-prominence height, in samples.
    pub min_width: f32,
}

/// Detector strategy selection; fixed by configuration, never inferred from
/// the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DetectorConfig {
    Contours(ContourParams),
    Peaks(PeakParams),
}

/// Complete parameter set for one detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Restrict analysis to this rectangle; `None` analyzes the full image.
    pub roi: Option<Region>,
    pub normalize: NormalizeConfig,
    pub detector: DetectorConfig,
}

fn check(ok: bool, name: &'static str, value: f64, expected: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(DetectError::ParameterOutOfRange { name, value, expected })
    }
}

fn odd_and_at_least(value: u32, min: u32) -> bool {
    value >= min && value % 2 == 1
}

impl DetectionParams {
    /// Reject any field outside its valid domain before pixels are touched.
    /// Nothing is clamped; a bad value is an error the caller must fix.
    pub fn validate(&self) -> Result<()> {
        if let Some(roi) = &self.roi {
            check(roi.width > 0, "roi.width", roi.width as f64, "> 0")?;
            check(roi.height > 0, "roi.height", roi.height as f64, "> 0")?;
        }
        self.normalize.validate()?;
        match &self.detector {
            DetectorConfig::Contours(p) => p.validate(),
            DetectorConfig::Peaks(p) => p.validate(),
        }
    }
}

impl NormalizeConfig {
    fn validate(&self) -> Result<()> {
        if let Some(gamma) = self.gamma {
            check(gamma.is_finite() && gamma > 0.0, "gamma", gamma as f64, "finite and > 0")?;
        }
        if let Some(clahe) = &self.clahe {
            check(clahe.tile_grid >= 1, "clahe.tile_grid", clahe.tile_grid as f64, ">= 1")?;
            check(
                clahe.clip_limit.is_finite() && clahe.clip_limit > 0.0,
                "clahe.clip_limit",
                clahe.clip_limit as f64,
                "finite and > 0",
            )?;
        }
        if let Some(blur) = &self.blur {
            match *blur {
                Blur::Gaussian { sigma } => {
                    check(sigma.is_finite() && sigma > 0.0, "blur.sigma", sigma as f64, "finite and > 0")?;
                }
                Blur::Directional { width, height } => {
                    check(odd_and_at_least(width, 1), "blur.width", width as f64, "odd and >= 1")?;
                    check(odd_and_at_least(height, 1), "blur.height", height as f64, "odd and >= 1")?;
                }
                Blur::Bilateral { window, sigma_color, sigma_spatial } => {
                    check(window >= 1, "blur.window", window as f64, ">= 1")?;
                    check(
                        sigma_color.is_finite() && sigma_color > 0.0,
                        "blur.sigma_color",
                        sigma_color as f64,
                        "finite and > 0",
                    )?;
                    check(
                        sigma_spatial.is_finite() && sigma_spatial > 0.0,
                        "blur.sigma_spatial",
                        sigma_spatial as f64,
                        "finite and > 0",
                    )?;
                }
            }
        }
        if let Some(linear) = &self.linear {
            check(
                linear.alpha.is_finite() && linear.alpha >= 0.0,
                "linear.alpha",
                linear.alpha as f64,
                "finite and >= 0",
            )?;
            check(linear.beta.is_finite(), "linear.beta", linear.beta as f64, "finite")?;
        }
        Ok(())
    }
}

impl ContourParams {
    fn validate(&self) -> Result<()> {
        if let Binarize::Adaptive { block_radius, .. } = self.binarize {
            check(block_radius >= 1, "binarize.block_radius", block_radius as f64, ">= 1")?;
        }
        check(
            self.edge_low.is_finite() && (0.0..=255.0).contains(&self.edge_low),
            "edge_low",
            self.edge_low as f64,
            "within [0, 255]",
        )?;
        check(
            self.edge_high.is_finite() && (0.0..=255.0).contains(&self.edge_high),
            "edge_high",
            self.edge_high as f64,
            "within [0, 255]",
        )?;
        check(self.edge_low <= self.edge_high, "edge_low", self.edge_low as f64, "<= edge_high")?;
        check(odd_and_at_least(self.open_kernel, 3), "open_kernel", self.open_kernel as f64, "odd and >= 3")?;
        check(odd_and_at_least(self.close_kernel, 3), "close_kernel", self.close_kernel as f64, "odd and >= 3")?;
        check(
            (1..=2).contains(&self.close_iterations),
            "close_iterations",
            self.close_iterations as f64,
            "1 or 2",
        )?;
        check(self.min_area.is_finite() && self.min_area > 0.0, "min_area", self.min_area, "> 0")?;
        Ok(())
    }
}

impl PeakParams {
    fn validate(&self) -> Result<()> {
        check(
            (1..=2).contains(&self.bands.count),
            "bands.count",
            self.bands.count as f64,
            "1 or 2",
        )?;
        check(self.bands.width >= 1, "bands.width", self.bands.width as f64, ">= 1")?;
        check(self.min_distance >= 1, "min_distance", self.min_distance as f64, ">= 1")?;
        check(
            self.min_prominence.is_finite() && self.min_prominence > 0.0,
            "min_prominence",
            self.min_prominence as f64,
            "finite and > 0",
        )?;
        check(
            self.min_width.is_finite() && self.min_width >= 0.0,
            "min_width",
            self.min_width as f64,
            "finite and >= 0",
        )?;
        Ok(())
    }
}

/// Parameter presets selectable by object geometry. Presets are plain
/// defaults; callers override fields on the returned value as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// Several separated objects counted by contour.
    TiledObjects,
    /// Presence check for one object, e.g. a label on a package face.
    SingleObject,
    /// Thin parallel bands counted along a vertical cross-section.
    StackedSheets,
}

impl Preset {
    pub fn params(self) -> DetectionParams {
        match self {
            Preset::TiledObjects => DetectionParams {
                roi: None,
                normalize: NormalizeConfig::default()
                    .with_grayscale(GrayscaleMode::Value)
                    .with_blur(Blur::Gaussian { sigma: 1.5 }),
                detector: DetectorConfig::Contours(ContourParams {
                    binarize: Binarize::Adaptive { block_radius: 15, offset: 5 },
                    edge_low: 80.0,
                    edge_high: 180.0,
                    open_kernel: 3,
                    close_kernel: 5,
                    close_iterations: 2,
                    min_area: 500.0,
                    largest_only: false,
                }),
            },
            Preset::SingleObject => DetectionParams {
                roi: None,
                normalize: NormalizeConfig::default().with_grayscale(GrayscaleMode::Value),
                detector: DetectorConfig::Contours(ContourParams {
                    binarize: Binarize::Global { threshold: 200 },
                    edge_low: 80.0,
                    edge_high: 180.0,
                    open_kernel: 3,
                    close_kernel: 5,
                    close_iterations: 2,
                    min_area: 100.0,
                    largest_only: true,
                }),
            },
            Preset::StackedSheets => DetectionParams {
                roi: None,
                normalize: NormalizeConfig::default().with_clahe(ClaheConfig::default()),
                detector: DetectorConfig::Peaks(PeakParams {
                    gradient: false,
                    bands: BandConfig { count: 1, width: 21, offset: 0 },
                    min_distance: 20,
                    min_prominence: 10.0,
                    min_width: 2.0,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectError;

    #[test]
    fn presets_validate() {
        for preset in [Preset::TiledObjects, Preset::SingleObject, Preset::StackedSheets] {
            preset.params().validate().unwrap();
        }
    }

    #[test]
    fn even_close_kernel_is_rejected() {
        let mut params = Preset::TiledObjects.params();
        if let DetectorConfig::Contours(c) = &mut params.detector {
            c.close_kernel = 4;
        }
        let err = params.validate().unwrap_err();
        assert!(matches!(err, DetectError::ParameterOutOfRange { name: "close_kernel", .. }));
    }

    #[test]
    fn inverted_edge_thresholds_are_rejected() {
        let mut params = Preset::SingleObject.params();
        if let DetectorConfig::Contours(c) = &mut params.detector {
            c.edge_low = 200.0;
            c.edge_high = 100.0;
        }
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_prominence_is_rejected() {
        let mut params = Preset::StackedSheets.params();
        if let DetectorConfig::Peaks(p) = &mut params.detector {
            p.min_prominence = 0.0;
        }
        assert!(params.validate().is_err());
    }

    #[test]
    fn nonpositive_gamma_is_rejected() {
        let mut params = Preset::StackedSheets.params();
        params.normalize = params.normalize.with_gamma(0.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_extent_roi_is_rejected() {
        let mut params = Preset::TiledObjects.params();
        params.roi = Some(crate::models::Region::new(0, 0, 0, 10));
        assert!(params.validate().is_err());
    }

    #[test]
    fn three_bands_are_rejected() {
        let mut params = Preset::StackedSheets.params();
        if let DetectorConfig::Peaks(p) = &mut params.detector {
            p.bands.count = 3;
        }
        assert!(params.validate().is_err());
    }
}
