//! Mirrored, exponentially windowed boundary extension.
//!
//! Samples beyond the border are taken from the mirror image of the line
//! (edge sample not repeated) and attenuated by
//! `exp(-EXP_WINDOW_EXPONENT * (d / F)^2)`, where `d` is the distance past
//! the border and `F` the fade-out distance. Past `F` the extension is zero.
//! Compared to zero padding this keeps the blurred border close to the
//! image content, so the border does not produce artificial extrema.

use crate::util::math::mirror_index;

/// Smallest fade-out distance in pixels.
pub const MIN_FADE_OUT: usize = 6;
/// Steepness of the exponential window.
pub const EXP_WINDOW_EXPONENT: f64 = 10.0;
/// Fade-out distance as a fraction of the axis extent, for long axes.
const FADE_OUT_FRACTION: f64 = 0.1;

/// Boundary policy for one axis.
#[derive(Clone, Debug)]
pub struct MirrorExpWindow {
    weights: Vec<f32>,
}

impl MirrorExpWindow {
    /// Builds the window for an axis of `len` samples.
    pub fn for_extent(len: usize) -> Self {
        let fade = MIN_FADE_OUT.max((FADE_OUT_FRACTION * len as f64).ceil() as usize);
        let weights = (0..=fade)
            .map(|d| {
                let rel = d as f64 / fade as f64;
                (-EXP_WINDOW_EXPONENT * rel * rel).exp() as f32
            })
            .collect();
        Self { weights }
    }

    /// Distance past the border at which the extension reaches zero.
    pub fn fade_out(&self) -> usize {
        self.weights.len() - 1
    }

    /// Window weight `distance` samples past the border.
    pub fn weight(&self, distance: usize) -> f32 {
        self.weights.get(distance).copied().unwrap_or(0.0)
    }

    /// Writes `line` padded by `radius` extended samples on both sides.
    pub fn extend_line(&self, line: &[f32], radius: usize, padded: &mut [f32]) {
        self.extend_with(line.len(), |i| line[i], radius, padded);
    }

    /// Same as `extend_line` for a line stored with a stride in `src`.
    pub(crate) fn extend_strided(
        &self,
        src: &[f32],
        start: usize,
        stride: usize,
        len: usize,
        radius: usize,
        padded: &mut [f32],
    ) {
        self.extend_with(len, |i| src[start + i * stride], radius, padded);
    }

    fn extend_with<F>(&self, len: usize, at: F, radius: usize, padded: &mut [f32])
    where
        F: Fn(usize) -> f32,
    {
        debug_assert_eq!(padded.len(), len + 2 * radius);
        for i in 0..len {
            padded[radius + i] = at(i);
        }
        for d in 1..=radius {
            let w = self.weight(d);
            let before = mirror_index(-(d as isize), len);
            let after = mirror_index((len - 1 + d) as isize, len);
            padded[radius - d] = if w > 0.0 { w * at(before) } else { 0.0 };
            padded[radius + len - 1 + d] = if w > 0.0 { w * at(after) } else { 0.0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MirrorExpWindow, MIN_FADE_OUT};

    #[test]
    fn fade_out_grows_with_long_axes() {
        assert_eq!(MirrorExpWindow::for_extent(20).fade_out(), MIN_FADE_OUT);
        assert_eq!(MirrorExpWindow::for_extent(300).fade_out(), 30);
    }

    #[test]
    fn weights_decay_to_zero() {
        let w = MirrorExpWindow::for_extent(10);
        assert_eq!(w.weight(0), 1.0);
        assert!(w.weight(1) < 1.0);
        assert!(w.weight(2) < w.weight(1));
        assert!(w.weight(w.fade_out()) < 1e-4);
        assert_eq!(w.weight(w.fade_out() + 1), 0.0);
    }

    #[test]
    fn extension_mirrors_and_attenuates() {
        let w = MirrorExpWindow::for_extent(4);
        let line = [1.0f32, 2.0, 3.0, 4.0];
        let mut padded = [0.0f32; 8];
        w.extend_line(&line, 2, &mut padded);
        assert_eq!(&padded[2..6], &line);
        assert!((padded[1] - w.weight(1) * 2.0).abs() < 1e-6);
        assert!((padded[0] - w.weight(2) * 3.0).abs() < 1e-6);
        assert!((padded[6] - w.weight(1) * 3.0).abs() < 1e-6);
        assert!((padded[7] - w.weight(2) * 2.0).abs() < 1e-6);
    }
}
