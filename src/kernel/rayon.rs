//! Rayon-parallel axis convolution (feature-gated).
//!
//! Lines of one axis are convolved concurrently into a line-major staging
//! buffer, then scattered back in line order. Every line goes through the
//! same kernel as the sequential path, so results are bit-identical.

use crate::kernel::{GaussianKernel1D, LineKernel};
use crate::scalespace::boundary::MirrorExpWindow;
use crate::scalespace::gaussian::AxisLines;
use crate::util::DogResult;
use crate::volume::try_filled;
use rayon::prelude::*;

pub(crate) fn convolve_axis_par<K: LineKernel>(
    src: &[f32],
    dst: &mut [f32],
    lines: AxisLines,
    kernel: &GaussianKernel1D,
    window: &MirrorExpWindow,
) -> DogResult<()> {
    let radius = kernel.radius();
    let taps = kernel.taps();
    let mut staged = try_filled(lines.count() * lines.len, 0.0f32)?;

    staged.par_chunks_mut(lines.len).enumerate().for_each_init(
        || vec![0.0f32; lines.len + 2 * radius],
        |padded, (line, out)| {
            let start = lines.start(line);
            window.extend_strided(src, start, lines.stride, lines.len, radius, padded);
            K::convolve_line(padded, taps, out);
        },
    );

    for (line, out) in staged.chunks(lines.len).enumerate() {
        lines.scatter(line, out, dst);
    }
    Ok(())
}
