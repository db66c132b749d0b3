pub mod annotate;
pub mod contours;
pub mod preprocessing;
pub mod profile;
pub mod roi;

use image::DynamicImage;

use crate::error::Result;
use crate::models::{Artifacts, DetectionResult, Features};
use crate::params::{DetectionParams, DetectorConfig};

/// Runs one full detection pass: region selection, photometric
/// normalization, the configured detector branch, and annotation.
///
/// A `Detector` holds no state beyond its parameters; independent instances
/// can process images in parallel without coordination.
pub struct Detector {
    pub params: DetectionParams,
    pub verbose: bool,
}

impl Detector {
    pub fn new(params: DetectionParams) -> Self {
        Self { params, verbose: false }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate parameters, then run the pipeline on `img`.
    ///
    /// A zero count is a valid result, not an error; the only failure modes
    /// are an empty clamped region and out-of-range parameters.
    pub fn detect(&self, img: &DynamicImage) -> Result<DetectionResult> {
        self.params.validate()?;

        let region = match &self.params.roi {
            Some(r) => roi::select(img, r)?,
            None => img.clone(),
        };
        if self.verbose {
            println!("Analyzing {}x{} region...", region.width(), region.height());
            println!("Normalizing...");
        }

        let gray = preprocessing::normalize(&region, &self.params.normalize);

        let result = match &self.params.detector {
            DetectorConfig::Contours(p) => {
                let stages = contours::detect(&gray, p);
                if self.verbose {
                    println!("Found {} contours above minimum area", stages.contours.len());
                }
                let annotated = annotate::annotate_contours(&region, &stages.contours);
                let count = stages.contours.len() as u32;
                DetectionResult {
                    count,
                    found: count > 0,
                    features: Features::Contours(stages.contours),
                    annotated,
                    artifacts: Artifacts {
                        normalized: gray,
                        mask: Some(stages.mask),
                        edges: Some(stages.edges),
                    },
                }
            }
            DetectorConfig::Peaks(p) => {
                let stages = profile::detect(&gray, p);
                if self.verbose {
                    println!("Found {} bands", stages.peaks.len());
                }
                let annotated = annotate::annotate_peaks(&region, &stages.peaks);
                let count = stages.peaks.len() as u32;
                DetectionResult {
                    count,
                    found: count > 0,
                    features: Features::Peaks {
                        peaks: stages.peaks,
                        raw: stages.raw,
                        search: stages.search,
                    },
                    annotated,
                    artifacts: Artifacts { normalized: gray, mask: None, edges: None },
                }
            }
        };
        Ok(result)
    }
}

/// One-shot detection with the given parameters.
pub fn detect(img: &DynamicImage, params: &DetectionParams) -> Result<DetectionResult> {
    Detector::new(params.clone()).detect(img)
}
