//! Scale parameters and the Difference-of-Gaussians response.
//!
//! For a blob of physical radius `r` in `n` dimensions the two scales
//!
//! ```text
//! sigma_inner[i] = 2 / (1 + sqrt(n)) * r / calibration[i]
//! sigma_outer[i] = sqrt(n) * sigma_inner[i]
//! ```
//!
//! make the difference of the two blurs approximate the scale-normalized
//! Laplacian of Gaussian tuned to that radius. Dividing by the calibration
//! converts the physical radius into pixels per axis, so anisotropic voxels
//! get anisotropic kernels.

pub mod boundary;
pub mod gaussian;

pub use boundary::MirrorExpWindow;
pub use gaussian::gaussian_blur;

use crate::trace::{trace_event, trace_span};
use crate::util::{DogError, DogResult};
use crate::volume::{Volume, VolumeView};

/// Inner and outer Gaussian standard deviations, in pixels, per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleVector {
    inner: Vec<f64>,
    outer: Vec<f64>,
}

impl ScaleVector {
    /// Standard deviations of the narrower blur.
    pub fn inner(&self) -> &[f64] {
        &self.inner
    }

    /// Standard deviations of the wider blur.
    pub fn outer(&self) -> &[f64] {
        &self.outer
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.inner.len()
    }
}

/// Derives the DoG scale pair for blobs of physical radius `radius`.
///
/// The caller guarantees `radius > 0` and positive calibration entries; the
/// dimensionality is `calibration.len()`.
pub fn derive_scales(radius: f64, calibration: &[f64]) -> ScaleVector {
    let sqrt_n = (calibration.len() as f64).sqrt();
    let factor = 2.0 / (1.0 + sqrt_n);
    let inner: Vec<f64> = calibration.iter().map(|&c| factor * radius / c).collect();
    let outer = inner.iter().map(|&s| sqrt_n * s).collect();
    ScaleVector { inner, outer }
}

/// Computes `blur(inner) - blur(outer)` of the working volume.
///
/// The response is positive on bright blobs of the tuned size. Both blurs
/// allocate a full-size buffer; an allocation failure aborts the stage.
pub fn difference_of_gaussian(
    working: VolumeView<'_, f32>,
    scales: &ScaleVector,
    parallel: bool,
) -> DogResult<Volume<f32>> {
    if scales.ndim() != working.ndim() {
        return Err(DogError::InvalidConfig(
            "scale vector length must match the volume dimensionality",
        ));
    }
    let _span = trace_span!("scale_space", ndim = working.ndim(), len = working.len()).entered();

    let mut response = gaussian_blur(working, scales.inner(), parallel)?;
    let outer = gaussian_blur(working, scales.outer(), parallel)?;
    for (r, &o) in response.data_mut().iter_mut().zip(outer.data()) {
        *r -= o;
    }

    trace_event!("dog_response", len = response.data().len());
    Ok(response)
}
