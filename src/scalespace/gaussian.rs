//! Separable Gaussian blur over n-dimensional volumes.

use crate::kernel::{DefaultLineKernel, GaussianKernel1D, LineKernel};
use crate::scalespace::boundary::MirrorExpWindow;
use crate::trace::trace_span;
use crate::util::{DogError, DogResult};
use crate::volume::{try_filled, try_to_vec, Volume, VolumeView};

/// Enumerates the 1D lines of a volume along one axis.
///
/// Line `l` starts at `(l / stride) * stride * len + l % stride` and its
/// samples are `stride` apart.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AxisLines {
    pub(crate) len: usize,
    pub(crate) stride: usize,
    count: usize,
}

impl AxisLines {
    pub(crate) fn new(dims: &[usize], axis: usize) -> Self {
        let stride: usize = dims[..axis].iter().product();
        let outer: usize = dims[axis + 1..].iter().product();
        Self {
            len: dims[axis],
            stride,
            count: stride * outer,
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn start(&self, line: usize) -> usize {
        let outer = line / self.stride;
        let inner = line % self.stride;
        outer * self.stride * self.len + inner
    }

    pub(crate) fn scatter(&self, line: usize, values: &[f32], dst: &mut [f32]) {
        let start = self.start(line);
        for (k, &v) in values.iter().enumerate() {
            dst[start + k * self.stride] = v;
        }
    }
}

pub(crate) fn convolve_axis<K: LineKernel>(
    src: &[f32],
    dst: &mut [f32],
    lines: AxisLines,
    kernel: &GaussianKernel1D,
    window: &MirrorExpWindow,
) -> DogResult<()> {
    let radius = kernel.radius();
    let mut padded = try_filled(lines.len + 2 * radius, 0.0f32)?;
    let mut out = try_filled(lines.len, 0.0f32)?;
    for line in 0..lines.count() {
        let start = lines.start(line);
        window.extend_strided(src, start, lines.stride, lines.len, radius, &mut padded);
        K::convolve_line(&padded, kernel.taps(), &mut out);
        lines.scatter(line, &out, dst);
    }
    Ok(())
}

/// Blurs `input` with a per-axis Gaussian of standard deviation `sigma`
/// (pixel units).
///
/// Axes of extent 1 are left untouched. Kernels are truncated at
/// `len - 1 + fade_out` taps, where every boundary sample is already zero. With `parallel` set and the `rayon`
/// feature enabled, the lines of each axis are convolved concurrently; the
/// result is identical to the sequential path.
pub fn gaussian_blur(
    input: VolumeView<'_, f32>,
    sigma: &[f64],
    parallel: bool,
) -> DogResult<Volume<f32>> {
    if sigma.len() != input.ndim() {
        return Err(DogError::InvalidConfig(
            "sigma length must match the volume dimensionality",
        ));
    }
    let dims = input.dims();
    let _span = trace_span!("gaussian_blur", ndim = dims.len(), parallel = parallel).entered();

    let mut cur = Volume::from_vec(try_to_vec(input.as_slice())?, dims.to_vec())?;
    let mut tmp = Volume::try_zeros(dims)?;

    for (axis, &s) in sigma.iter().enumerate() {
        if dims[axis] == 1 {
            continue;
        }
        let window = MirrorExpWindow::for_extent(dims[axis]);
        let kernel = GaussianKernel1D::with_max_radius(s, dims[axis] - 1 + window.fade_out())?;
        let lines = AxisLines::new(dims, axis);
        run_axis(cur.data(), tmp.data_mut(), lines, &kernel, &window, parallel)?;
        std::mem::swap(&mut cur, &mut tmp);
    }

    Ok(cur)
}

#[cfg(feature = "rayon")]
fn run_axis(
    src: &[f32],
    dst: &mut [f32],
    lines: AxisLines,
    kernel: &GaussianKernel1D,
    window: &MirrorExpWindow,
    parallel: bool,
) -> DogResult<()> {
    if parallel {
        crate::kernel::rayon::convolve_axis_par::<DefaultLineKernel>(src, dst, lines, kernel, window)
    } else {
        convolve_axis::<DefaultLineKernel>(src, dst, lines, kernel, window)
    }
}

#[cfg(not(feature = "rayon"))]
fn run_axis(
    src: &[f32],
    dst: &mut [f32],
    lines: AxisLines,
    kernel: &GaussianKernel1D,
    window: &MirrorExpWindow,
    _parallel: bool,
) -> DogResult<()> {
    convolve_axis::<DefaultLineKernel>(src, dst, lines, kernel, window)
}
