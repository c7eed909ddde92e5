//! Local second-order Taylor fit of an n-dimensional sampled function.

use crate::util::math::mirror_index;
use crate::volume::VolumeView;
use nalgebra::{DMatrix, DVector};

/// Gradient and Hessian estimated by finite differences at a grid point.
///
/// Samples outside the volume are read through reflect-101 mirroring, so the
/// fit is defined on the border as well. Axes of extent 1 carry no
/// curvature and are left out of the fit; their offset is always zero.
pub(crate) struct QuadraticFit {
    axes: Vec<usize>,
    ndim: usize,
    gradient: DVector<f64>,
    hessian: DMatrix<f64>,
}

impl QuadraticFit {
    pub(crate) fn at(volume: VolumeView<'_, f32>, base: &[usize]) -> Self {
        let dims = volume.dims();
        let strides = volume.strides();
        let data = volume.as_slice();
        let axes: Vec<usize> = (0..dims.len()).filter(|&a| dims[a] > 1).collect();
        let m = axes.len();

        let sample = |shifts: &[(usize, isize)]| -> f64 {
            let mut idx = 0usize;
            for (axis, (&b, &extent)) in base.iter().zip(dims).enumerate() {
                let step: isize = shifts
                    .iter()
                    .filter(|(a, _)| *a == axis)
                    .map(|(_, s)| *s)
                    .sum();
                idx += mirror_index(b as isize + step, extent) * strides[axis];
            }
            f64::from(data[idx])
        };

        let center = sample(&[]);
        let mut gradient = DVector::zeros(m);
        let mut hessian = DMatrix::zeros(m, m);
        for (i, &ai) in axes.iter().enumerate() {
            let plus = sample(&[(ai, 1)]);
            let minus = sample(&[(ai, -1)]);
            gradient[i] = 0.5 * (plus - minus);
            hessian[(i, i)] = plus - 2.0 * center + minus;
            for (j, &aj) in axes.iter().enumerate().skip(i + 1) {
                let pp = sample(&[(ai, 1), (aj, 1)]);
                let pm = sample(&[(ai, 1), (aj, -1)]);
                let mp = sample(&[(ai, -1), (aj, 1)]);
                let mm = sample(&[(ai, -1), (aj, -1)]);
                let mixed = 0.25 * (pp - pm - mp + mm);
                hessian[(i, j)] = mixed;
                hessian[(j, i)] = mixed;
            }
        }

        Self {
            axes,
            ndim: dims.len(),
            gradient,
            hessian,
        }
    }

    /// Offset to the stationary point of the fitted maximum, one entry per
    /// volume axis.
    ///
    /// Solves `H * delta = -g` through a Cholesky factorization of `-H`,
    /// which only exists when `H` is negative definite. Returns `None` for a
    /// singular or indefinite Hessian, or a non-finite solution.
    pub(crate) fn maximum_offset(&self) -> Option<Vec<f64>> {
        let mut offset = vec![0.0; self.ndim];
        if self.axes.is_empty() {
            return Some(offset);
        }
        let chol = (-&self.hessian).cholesky()?;
        let delta = chol.solve(&self.gradient);
        if !delta.iter().all(|v| v.is_finite()) {
            return None;
        }
        for (&axis, &d) in self.axes.iter().zip(delta.iter()) {
            offset[axis] = d;
        }
        Some(offset)
    }
}
