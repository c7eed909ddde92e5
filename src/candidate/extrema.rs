//! Local extrema of the DoG response.

use crate::trace::{trace_event, trace_span};
use crate::util::{DogError, DogResult};
use crate::volume::{strides_for, Sample, VolumeView};

/// Whether a peak is a local maximum or minimum of the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtremumKind {
    /// Strictly greater than every in-bounds neighbor.
    Maximum,
    /// Strictly smaller than every in-bounds neighbor.
    Minimum,
}

/// Discrete extremum of the response volume.
#[derive(Clone, Debug, PartialEq)]
pub struct Peak {
    /// Integer position, axis 0 first.
    pub position: Vec<usize>,
    /// Extremum type.
    pub kind: ExtremumKind,
    /// Response value at `position`.
    pub value: f32,
}

/// Offsets of the full `3^n - 1` Chebyshev neighborhood.
fn neighbor_offsets(ndim: usize) -> Vec<Vec<isize>> {
    let mut offsets = vec![Vec::with_capacity(ndim)];
    for _ in 0..ndim {
        let mut next = Vec::with_capacity(offsets.len() * 3);
        for base in &offsets {
            for step in [-1isize, 0, 1] {
                let mut off = base.clone();
                off.push(step);
                next.push(off);
            }
        }
        offsets = next;
    }
    offsets.retain(|off| off.iter().any(|&s| s != 0));
    offsets
}

/// Advances `pos` to the next raster position (axis 0 fastest).
pub(crate) fn advance(pos: &mut [usize], dims: &[usize]) {
    for (p, &extent) in pos.iter_mut().zip(dims) {
        *p += 1;
        if *p < extent {
            return;
        }
        *p = 0;
    }
}

/// Finds all strict local maxima and minima of `response`.
///
/// Every element, border included, is compared against its in-bounds
/// Chebyshev neighbors only; positions outside the volume take no part.
/// An element with no in-bounds neighbor is never an extremum. Peaks are
/// returned in raster order.
pub fn find_extrema(response: VolumeView<'_, f32>) -> Vec<Peak> {
    let _span = trace_span!("find_extrema", len = response.len()).entered();

    let dims = response.dims();
    let strides = strides_for(dims);
    let data = response.as_slice();
    let offsets: Vec<(Vec<isize>, isize)> = neighbor_offsets(dims.len())
        .into_iter()
        .map(|off| {
            let delta = off
                .iter()
                .zip(&strides)
                .map(|(&s, &stride)| s * stride as isize)
                .sum();
            (off, delta)
        })
        .collect();

    let mut peaks = Vec::new();
    let mut pos = vec![0usize; dims.len()];
    for (idx, &value) in data.iter().enumerate() {
        let mut is_max = true;
        let mut is_min = true;
        let mut compared = false;
        for (off, delta) in &offsets {
            let inside = pos
                .iter()
                .zip(off)
                .zip(dims)
                .all(|((&p, &s), &extent)| {
                    let q = p as isize + s;
                    q >= 0 && q < extent as isize
                });
            if !inside {
                continue;
            }
            compared = true;
            let other = data[(idx as isize + delta) as usize];
            is_max &= value > other;
            is_min &= value < other;
            if !is_max && !is_min {
                break;
            }
        }

        if compared && (is_max || is_min) {
            peaks.push(Peak {
                position: pos.clone(),
                kind: if is_max {
                    ExtremumKind::Maximum
                } else {
                    ExtremumKind::Minimum
                },
                value,
            });
        }
        advance(&mut pos, dims);
    }

    trace_event!("extrema", count = peaks.len());
    peaks
}

/// Keeps the maxima whose sample in `threshold_image` is at least
/// `threshold`.
///
/// The threshold is applied to image intensity at the peak pixel, not to
/// the response value, so strong but dim response peaks are rejected.
pub fn select_maxima<T: Sample>(
    extrema: Vec<Peak>,
    threshold_image: VolumeView<'_, T>,
    threshold: f32,
) -> DogResult<Vec<Peak>> {
    let total = extrema.len();
    let mut kept = Vec::new();
    for peak in extrema {
        if peak.kind != ExtremumKind::Maximum {
            continue;
        }
        let sample = threshold_image.get(&peak.position).ok_or_else(|| {
            DogError::ExtentMismatch {
                expected: threshold_image.dims().to_vec(),
                got: peak.position.iter().map(|&p| p + 1).collect(),
            }
        })?;
        if sample.to_f32() >= threshold {
            kept.push(peak);
        }
    }
    trace_event!("maxima_kept", extrema = total, kept = kept.len());
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_counts_follow_three_pow_n() {
        assert_eq!(neighbor_offsets(1).len(), 2);
        assert_eq!(neighbor_offsets(2).len(), 8);
        assert_eq!(neighbor_offsets(3).len(), 26);
    }

    #[test]
    fn diagonal_neighbor_blocks_maximum() {
        #[rustfmt::skip]
        let data = [
            0.0f32, 0.0, 0.0, 0.0,
            0.0,    5.0, 0.0, 0.0,
            0.0,    0.0, 6.0, 0.0,
            0.0,    0.0, 0.0, 0.0,
        ];
        let dims = [4usize, 4];
        let view = VolumeView::new(&data, &dims).unwrap();
        let maxima: Vec<_> = find_extrema(view)
            .into_iter()
            .filter(|p| p.kind == ExtremumKind::Maximum)
            .collect();
        assert_eq!(maxima.len(), 1);
        assert_eq!(maxima[0].position, vec![2, 2]);
        assert_eq!(maxima[0].value, 6.0);
    }

    #[test]
    fn border_elements_use_in_bounds_neighbors() {
        let data = [3.0f32, 1.0, 2.0, 0.5, 4.0];
        let dims = [5usize];
        let view = VolumeView::new(&data, &dims).unwrap();
        let peaks = find_extrema(view);
        let maxima: Vec<_> = peaks
            .iter()
            .filter(|p| p.kind == ExtremumKind::Maximum)
            .map(|p| p.position[0])
            .collect();
        let minima: Vec<_> = peaks
            .iter()
            .filter(|p| p.kind == ExtremumKind::Minimum)
            .map(|p| p.position[0])
            .collect();
        assert_eq!(maxima, vec![0, 2, 4]);
        assert_eq!(minima, vec![1, 3]);
    }

    #[test]
    fn plateaus_are_not_extrema() {
        let data = [1.0f32; 9];
        let dims = [3usize, 3];
        let view = VolumeView::new(&data, &dims).unwrap();
        assert!(find_extrema(view).is_empty());
    }

    #[test]
    fn single_sample_has_no_extremum() {
        let data = [1.0f32];
        let dims = [1usize];
        let view = VolumeView::new(&data, &dims).unwrap();
        assert!(find_extrema(view).is_empty());
    }

    #[test]
    fn select_maxima_thresholds_on_image_intensity() {
        let peaks = vec![
            Peak {
                position: vec![0, 0],
                kind: ExtremumKind::Maximum,
                value: 9.0,
            },
            Peak {
                position: vec![1, 0],
                kind: ExtremumKind::Maximum,
                value: 0.1,
            },
            Peak {
                position: vec![0, 1],
                kind: ExtremumKind::Minimum,
                value: -3.0,
            },
        ];
        let image = [10u8, 200, 255, 0];
        let dims = [2usize, 2];
        let view = VolumeView::new(&image, &dims).unwrap();
        let kept = select_maxima(peaks, view, 100.0).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].position, vec![1, 0]);
    }
}
