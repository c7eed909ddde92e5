//! High-level DoG spot detector.
//!
//! `Detector::detect` runs the full pipeline on one volume: optional
//! pre-filter, DoG response at the scale pair derived from the expected
//! radius, maxima extraction with an intensity threshold, optional sub-pixel
//! refinement, calibration into physical units, and greedy overlap
//! suppression. The detector holds no mutable state, so one instance may be
//! shared by threads that process independent frames.

#[cfg(feature = "rayon")]
mod frames;

#[cfg(feature = "rayon")]
pub use frames::detect_frames;

use crate::candidate::extrema::{find_extrema, select_maxima};
use crate::candidate::spot::{assemble_spots, Spot};
use crate::candidate::suppress::suppress_overlapping;
use crate::prefilter::{MedianFilter, PreFilter};
use crate::refine::{localize_subpixel, RefinedPeak};
use crate::scalespace::{derive_scales, difference_of_gaussian};
use crate::trace::{trace_event, trace_span};
use crate::util::{DetectError, DogError, DogResult, Stage};
use crate::volume::{Sample, VolumeView};

/// Image the intensity threshold is measured on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThresholdImage {
    /// The caller's unfiltered input.
    #[default]
    Raw,
    /// The pre-filtered working image (same as `Raw` without pre-filter).
    Filtered,
}

/// Detection settings.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Expected blob radius in physical units.
    pub expected_radius: f64,
    /// Minimum image intensity at a peak pixel.
    pub threshold: f32,
    /// Run the pre-filter before the scale-space stage.
    pub use_median_filter: bool,
    /// Refine peak positions to sub-pixel precision.
    pub subpixel: bool,
    /// Image used for the intensity threshold.
    pub threshold_image: ThresholdImage,
    /// How often sub-pixel refinement may move a peak by one pixel.
    pub max_subpixel_moves: usize,
    /// Convolve lines concurrently (requires the `rayon` feature).
    ///
    /// Off by default: frames are the natural unit of parallelism and
    /// callers are expected to spread frames across threads instead.
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            expected_radius: 5.0,
            threshold: 0.0,
            use_median_filter: false,
            subpixel: true,
            threshold_image: ThresholdImage::Raw,
            max_subpixel_moves: 4,
            parallel: false,
        }
    }
}

impl DetectorConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> DogResult<()> {
        if !self.expected_radius.is_finite() || self.expected_radius <= 0.0 {
            return Err(DogError::InvalidConfig(
                "expected_radius must be finite and > 0",
            ));
        }
        if self.threshold.is_nan() {
            return Err(DogError::InvalidConfig("threshold must not be NaN"));
        }
        Ok(())
    }
}

/// Checks that `calibration` has one finite, positive entry per axis.
pub fn validate_calibration(calibration: &[f64], ndim: usize) -> DogResult<()> {
    if calibration.len() != ndim {
        return Err(DogError::CalibrationMismatch {
            expected: ndim,
            got: calibration.len(),
        });
    }
    for (axis, &value) in calibration.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(DogError::InvalidCalibration { axis, value });
        }
    }
    Ok(())
}

/// DoG spot detector with a pluggable pre-filter.
#[derive(Clone, Debug)]
pub struct Detector<P = MedianFilter> {
    cfg: DetectorConfig,
    prefilter: P,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl Detector {
    /// Creates a detector using the default median pre-filter.
    pub fn new(cfg: DetectorConfig) -> Self {
        Self {
            cfg,
            prefilter: MedianFilter::default(),
        }
    }
}

impl<P: PreFilter> Detector<P> {
    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: DetectorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replaces the pre-filter used when `use_median_filter` is set.
    pub fn with_prefilter<Q: PreFilter>(self, prefilter: Q) -> Detector<Q> {
        Detector {
            cfg: self.cfg,
            prefilter,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    /// Detects spots in `image`.
    ///
    /// `calibration` holds the physical size of one pixel per axis. On
    /// success the spots are ordered by descending quality and no two of
    /// them overlap; the list may be empty. Any fatal condition aborts
    /// before spots are built and is reported with the failing stage.
    pub fn detect<T: Sample>(
        &self,
        image: VolumeView<'_, T>,
        calibration: &[f64],
    ) -> Result<Vec<Spot>, DetectError> {
        let cfg = &self.cfg;
        let _span = trace_span!("detect", ndim = image.ndim(), len = image.len()).entered();

        cfg.validate().map_err(DetectError::at(Stage::Input))?;
        validate_calibration(calibration, image.ndim()).map_err(DetectError::at(Stage::Input))?;

        let raw = image.to_f32().map_err(DetectError::at(Stage::Input))?;
        let filtered = if cfg.use_median_filter {
            let out = self
                .prefilter
                .apply(raw.view())
                .and_then(|out| {
                    if out.dims() == raw.dims() {
                        Ok(out)
                    } else {
                        Err(DogError::ExtentMismatch {
                            expected: raw.dims().to_vec(),
                            got: out.dims().to_vec(),
                        })
                    }
                })
                .map_err(DetectError::at(Stage::PreFilter))?;
            Some(out)
        } else {
            None
        };
        let working = filtered.as_ref().unwrap_or(&raw);

        let scales = derive_scales(cfg.expected_radius, calibration);
        let response = difference_of_gaussian(working.view(), &scales, cfg.parallel)
            .map_err(DetectError::at(Stage::ScaleSpace))?;

        let extrema = find_extrema(response.view());
        let maxima = match cfg.threshold_image {
            ThresholdImage::Raw => select_maxima(extrema, image, cfg.threshold),
            ThresholdImage::Filtered => select_maxima(extrema, working.view(), cfg.threshold),
        }
        .map_err(DetectError::at(Stage::PeakExtraction))?;

        let refined: Vec<RefinedPeak> = if cfg.subpixel && !maxima.is_empty() {
            localize_subpixel(response.view(), maxima, cfg.max_subpixel_moves)
                .map_err(DetectError::at(Stage::Localization))?
        } else {
            maxima.into_iter().map(RefinedPeak::unrefined).collect()
        };
        drop(response);

        let spots = assemble_spots(&refined, calibration, cfg.expected_radius);
        let kept = suppress_overlapping(spots);
        trace_event!("spots", candidates = refined.len(), kept = kept.len());
        Ok(kept)
    }
}

/// Runs a one-off detection with the default median pre-filter.
pub fn detect<T: Sample>(
    image: VolumeView<'_, T>,
    calibration: &[f64],
    cfg: &DetectorConfig,
) -> Result<Vec<Spot>, DetectError> {
    Detector::new(cfg.clone()).detect(image, calibration)
}
