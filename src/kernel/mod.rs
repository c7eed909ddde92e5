//! 1D Gaussian kernels and line convolution backends.
//!
//! The scale-space stage blurs a volume one axis at a time. Every line along
//! the current axis is first extended at both ends by the boundary policy,
//! then convolved with a symmetric kernel by a `LineKernel` backend.

use crate::util::{DogError, DogResult};
use crate::volume::try_filled;

/// Normalized, symmetric 1D Gaussian kernel.
///
/// `radius = max(1, ceil(3 * sigma))` and the taps sum to one.
#[derive(Clone, Debug)]
pub struct GaussianKernel1D {
    sigma: f64,
    radius: usize,
    taps: Vec<f32>,
}

impl GaussianKernel1D {
    /// Builds the kernel for a standard deviation in pixel units.
    pub fn new(sigma: f64) -> DogResult<Self> {
        Self::with_max_radius(sigma, usize::MAX)
    }

    /// Builds the kernel with its half-width limited to `max_radius`.
    ///
    /// A truncated kernel is renormalized over the taps it keeps. Tap and
    /// buffer allocation failures are returned as `AllocationFailed`.
    pub fn with_max_radius(sigma: f64, max_radius: usize) -> DogResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(DogError::InvalidConfig("sigma must be finite and > 0"));
        }
        // `as` saturates, so huge sigmas land on `max_radius`.
        let radius = ((3.0 * sigma).ceil() as usize).min(max_radius).max(1);
        let len = radius
            .checked_mul(2)
            .and_then(|v| v.checked_add(1))
            .ok_or(DogError::AllocationFailed { len: usize::MAX })?;
        let two_sigma2 = 2.0 * sigma * sigma;
        let mut raw = try_filled(len, 0.0f64)?;
        for (i, v) in raw.iter_mut().enumerate() {
            let x = i as f64 - radius as f64;
            *v = (-(x * x) / two_sigma2).exp();
        }
        let sum: f64 = raw.iter().sum();
        let mut taps = try_filled(len, 0.0f32)?;
        for (t, &v) in taps.iter_mut().zip(&raw) {
            *t = (v / sum) as f32;
        }
        Ok(Self {
            sigma,
            radius,
            taps,
        })
    }

    /// Standard deviation in pixels.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Half-width of the kernel.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Kernel taps, `2 * radius + 1` long.
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Convolution of one boundary-extended line.
pub trait LineKernel {
    /// Writes `dst[i] = sum_k taps[k] * src[i + k]`.
    ///
    /// `src` must hold `dst.len() + taps.len() - 1` samples, i.e. the line
    /// padded by the kernel radius on both sides.
    fn convolve_line(src: &[f32], taps: &[f32], dst: &mut [f32]);
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub(crate) mod rayon;

/// Line kernel selected at compile time.
#[cfg(not(feature = "simd"))]
pub(crate) type DefaultLineKernel = scalar::LineScalar;
#[cfg(feature = "simd")]
pub(crate) type DefaultLineKernel = simd::LineSimd;
