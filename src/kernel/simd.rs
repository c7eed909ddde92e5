//! SIMD-accelerated line convolution using the `wide` crate.
//!
//! Eight consecutive output samples are accumulated at once with `f32x8`.
//! Each lane performs the same multiply-then-add sequence as the scalar
//! kernel, so results match it exactly.

use crate::kernel::scalar::LineScalar;
use crate::kernel::LineKernel;
use wide::f32x8;

const LANES: usize = 8;

#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Vectorized line convolution over blocks of eight outputs.
pub struct LineSimd;

impl LineKernel for LineSimd {
    fn convolve_line(src: &[f32], taps: &[f32], dst: &mut [f32]) {
        debug_assert_eq!(src.len() + 1, dst.len() + taps.len());
        let simd_end = dst.len() / LANES * LANES;

        let mut i = 0;
        while i < simd_end {
            let mut acc = f32x8::ZERO;
            for (k, &t) in taps.iter().enumerate() {
                acc += f32x8::splat(t) * load_f32x8(&src[i + k..]);
            }
            dst[i..i + LANES].copy_from_slice(&acc.to_array());
            i += LANES;
        }

        // Scalar remainder
        if i < dst.len() {
            LineScalar::convolve_line(&src[i..], taps, &mut dst[i..]);
        }
    }
}
