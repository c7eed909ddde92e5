//! Scalar reference line convolution.

use crate::kernel::LineKernel;

/// Straightforward tap-by-tap convolution.
pub struct LineScalar;

impl LineKernel for LineScalar {
    fn convolve_line(src: &[f32], taps: &[f32], dst: &mut [f32]) {
        debug_assert_eq!(src.len() + 1, dst.len() + taps.len());
        for (i, out) in dst.iter_mut().enumerate() {
            let window = &src[i..i + taps.len()];
            let mut acc = 0.0f32;
            for (&t, &s) in taps.iter().zip(window) {
                acc += t * s;
            }
            *out = acc;
        }
    }
}
