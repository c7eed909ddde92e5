//! Parallel detection over the frames of a time series (feature-gated).

use crate::candidate::spot::Spot;
use crate::detector::Detector;
use crate::prefilter::PreFilter;
use crate::util::DetectError;
use crate::volume::{Sample, VolumeView};
use rayon::prelude::*;

/// Runs `detector` on every frame, one frame per rayon task.
///
/// Results are returned in frame order; a failing frame does not affect the
/// others. Each frame's own convolution follows `DetectorConfig::parallel`.
pub fn detect_frames<T: Sample, P: PreFilter>(
    detector: &Detector<P>,
    frames: &[VolumeView<'_, T>],
    calibration: &[f64],
) -> Vec<Result<Vec<Spot>, DetectError>> {
    frames
        .par_iter()
        .map(|frame| detector.detect(*frame, calibration))
        .collect()
}
