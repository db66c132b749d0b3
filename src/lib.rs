pub mod detection;
pub mod error;
pub mod io;
pub mod models;
pub mod params;
pub mod review;

pub use detection::{Detector, detect};
pub use error::{DetectError, Result};
pub use models::{
    Artifacts, BoundingBox, Contour, DetectionResult, Features, Peak, Profile, Region,
};
pub use params::{
    BandConfig, Binarize, Blur, ClaheConfig, ContourParams, DetectionParams, DetectorConfig,
    GrayscaleMode, LinearAdjust, NormalizeConfig, PeakParams, Preset,
};
pub use review::{FinalCount, reconcile};
