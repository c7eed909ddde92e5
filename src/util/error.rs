//! Error types for dogspot.

use std::fmt;
use thiserror::Error;

/// Fixed identifier prepended to every detection failure message.
pub const DETECTOR_ID: &str = "DogDetector";

/// Result alias for dogspot operations.
pub type DogResult<T> = std::result::Result<T, DogError>;

/// Errors raised by the individual detection stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DogError {
    /// Volume extents are empty, contain a zero, or overflow `usize`.
    #[error("invalid dimensions {dims:?}")]
    InvalidDimensions { dims: Vec<usize> },
    /// The sample buffer does not hold exactly one value per voxel.
    #[error("buffer size mismatch: needed {needed}, got {got}")]
    BufferSizeMismatch { needed: usize, got: usize },
    /// Two volumes that must share an extent do not.
    #[error("extent mismatch: expected {expected:?}, got {got:?}")]
    ExtentMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// Calibration length differs from the volume dimensionality.
    #[error("calibration has {got} entries for a {expected}-dimensional volume")]
    CalibrationMismatch { expected: usize, got: usize },
    /// A calibration entry is not a finite positive number.
    #[error("calibration for axis {axis} must be finite and > 0, got {value}")]
    InvalidCalibration { axis: usize, value: f64 },
    /// Detector configuration is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// An intermediate floating-point buffer could not be allocated.
    #[error("could not allocate an intermediate buffer of {len} samples")]
    AllocationFailed { len: usize },
    /// The pre-filter collaborator reported a failure.
    #[error("pre-filter failed: {reason}")]
    PreFilterFailed { reason: String },
    /// Internal precondition of the sub-pixel localizer was violated.
    #[error("localization failed: {reason}")]
    Localization { reason: String },
    /// Image decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}

/// Pipeline stage that produced a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Input and configuration validation.
    Input,
    /// The pre-filter (median) collaborator.
    PreFilter,
    /// Gaussian blurs and their difference.
    ScaleSpace,
    /// Extrema search and intensity threshold.
    PeakExtraction,
    /// Sub-pixel refinement.
    Localization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::PreFilter => "pre-filter",
            Stage::ScaleSpace => "scale-space",
            Stage::PeakExtraction => "peak-extraction",
            Stage::Localization => "localization",
        };
        f.write_str(name)
    }
}

/// Fatal failure of a whole `detect` call.
///
/// Renders as `"DogDetector: <stage>: <message>"`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{id}: {stage}: {source}", id = DETECTOR_ID)]
pub struct DetectError {
    /// Stage that failed.
    pub stage: Stage,
    /// Underlying stage error.
    pub source: DogError,
}

impl DetectError {
    pub(crate) fn at(stage: Stage) -> impl FnOnce(DogError) -> Self {
        move |source| Self { stage, source }
    }
}
