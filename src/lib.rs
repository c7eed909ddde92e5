//! dogspot is an n-dimensional Difference-of-Gaussians spot detector.
//!
//! Given a calibrated scalar volume and an expected blob radius, it returns
//! non-overlapping spots in physical coordinates with a quality score,
//! optionally refined to sub-pixel precision. Convolution runs
//! single-threaded by default; the `rayon` feature adds opt-in line
//! parallelism and a helper that spreads the frames of a time series over a
//! thread pool. `simd` vectorizes the line convolution, `image-io` loads 2D
//! frames from disk, and `tracing` emits spans and counts for every stage.

mod candidate;
pub mod detector;
pub mod kernel;
pub mod lowlevel;
pub mod prefilter;
pub mod refine;
pub mod scalespace;
mod trace;
pub mod util;
pub mod volume;

#[cfg(feature = "image-io")]
pub use volume::io;

pub use candidate::extrema::{ExtremumKind, Peak};
pub use candidate::spot::Spot;
pub use detector::{detect, validate_calibration, Detector, DetectorConfig, ThresholdImage};
pub use prefilter::{MedianFilter, PreFilter};
pub use refine::{RefinedPeak, Refinement};
pub use scalespace::ScaleVector;
pub use util::{DetectError, DogError, DogResult, Stage, DETECTOR_ID};
pub use volume::{Sample, Volume, VolumeView};

#[cfg(feature = "rayon")]
pub use detector::detect_frames;
