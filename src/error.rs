use thiserror::Error;

/// Errors produced by the detection core.
#[derive(Error, Debug)]
pub enum DetectError {
    /// The requested region clamps to an empty rectangle.
    #[error("region of interest clamps to an empty rectangle inside a {width}x{height} image")]
    InvalidRegion {
        /// Width of the image the region was applied to.
        width: u32,
        /// Height of the image the region was applied to.
        height: u32,
    },

    /// The input bytes do not decode into an image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// A detection parameter lies outside its valid range.
    #[error("parameter `{name}` out of range: got {value}, expected {expected}")]
    ParameterOutOfRange {
        /// Field name as exposed to callers.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Human-readable description of the valid range.
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, DetectError>;
