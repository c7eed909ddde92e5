//! Box median filter over n-dimensional volumes.

use crate::candidate::extrema::advance;
use crate::prefilter::PreFilter;
use crate::trace::trace_span;
use crate::util::{DogError, DogResult};
use crate::volume::{strides_for, Volume, VolumeView};

/// Median over a `(2 * radius + 1)^n` window, clipped at the borders.
///
/// For even sample counts (clipped windows) the upper median is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MedianFilter {
    /// Half-width of the window along every axis.
    pub radius: usize,
}

impl Default for MedianFilter {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl PreFilter for MedianFilter {
    fn apply(&self, input: VolumeView<'_, f32>) -> DogResult<Volume<f32>> {
        let _span = trace_span!("prefilter", radius = self.radius).entered();

        let dims = input.dims();
        let strides = strides_for(dims);
        let data = input.as_slice();
        let mut out = Volume::try_zeros(dims)?;
        // Windows are clipped at the borders, so a half-width past the extent
        // selects nothing new.
        let half: Vec<usize> = dims.iter().map(|&d| self.radius.min(d - 1)).collect();
        let offset_dims: Vec<usize> = half.iter().map(|&h| 2 * h + 1).collect();
        let window_len = offset_dims
            .iter()
            .try_fold(1usize, |acc, &side| acc.checked_mul(side))
            .ok_or_else(|| DogError::PreFilterFailed {
                reason: format!("median window of radius {} overflows", self.radius),
            })?;
        let mut window = Vec::new();
        window
            .try_reserve_exact(window_len)
            .map_err(|_| DogError::AllocationFailed { len: window_len })?;
        let mut offset = vec![0usize; dims.len()];
        let mut pos = vec![0usize; dims.len()];

        for dst in out.data_mut().iter_mut() {
            window.clear();
            offset.iter_mut().for_each(|o| *o = 0);
            for _ in 0..window_len {
                let mut idx = 0usize;
                let mut inside = true;
                for axis in 0..dims.len() {
                    let q = pos[axis] as isize + offset[axis] as isize - half[axis] as isize;
                    if q < 0 || q >= dims[axis] as isize {
                        inside = false;
                        break;
                    }
                    idx += q as usize * strides[axis];
                }
                if inside {
                    window.push(data[idx]);
                }
                advance(&mut offset, &offset_dims);
            }
            let mid = window.len() / 2;
            let (_, median, _) = window.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
            *dst = *median;
            advance(&mut pos, dims);
        }

        Ok(out)
    }
}
