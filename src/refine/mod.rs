//! Sub-pixel localization of response peaks.
//!
//! Each peak is refined by fitting a local quadratic to the response and
//! solving for its stationary point. When the solution lies more than half a
//! pixel away along some axis, the integer base moves one pixel toward it and
//! the fit is repeated, within a small move budget. Failures are local: a
//! peak that does not converge, or whose Hessian is not negative definite,
//! keeps its integer position.

mod quadnd;

use crate::candidate::extrema::Peak;
use crate::trace::{trace_event, trace_span};
use crate::util::{DogError, DogResult};
use crate::volume::VolumeView;
use quadnd::QuadraticFit;

/// Outcome of refining one peak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refinement {
    /// The fit converged; the position is fractional.
    Converged,
    /// The move budget ran out, a move was blocked by the border, or the
    /// solution drifted a full pixel from the peak; integer position kept.
    NotConverged,
    /// Singular or indefinite Hessian; integer position kept.
    Degenerate,
    /// Sub-pixel localization was not requested.
    Skipped,
}

/// Peak with its final real-valued position.
#[derive(Clone, Debug, PartialEq)]
pub struct RefinedPeak {
    /// The discrete peak this position originates from.
    pub peak: Peak,
    /// Position in pixel units, axis 0 first.
    pub position: Vec<f64>,
    /// How the position was obtained.
    pub status: Refinement,
}

impl RefinedPeak {
    /// Wraps a peak at its integer position without refinement.
    pub fn unrefined(peak: Peak) -> Self {
        Self::fallback(peak, Refinement::Skipped)
    }

    fn fallback(peak: Peak, status: Refinement) -> Self {
        let position = peak.position.iter().map(|&p| p as f64).collect();
        Self {
            peak,
            position,
            status,
        }
    }
}

/// Refines every peak against `response`; output is one-to-one with input.
///
/// `max_moves` bounds how often the integer base may shift. A converged
/// position always lies strictly within one pixel of the original peak on
/// every axis. Returns an error only when a peak does not index into
/// `response`, which means the caller mixed up volumes.
pub fn localize_subpixel(
    response: VolumeView<'_, f32>,
    peaks: Vec<Peak>,
    max_moves: usize,
) -> DogResult<Vec<RefinedPeak>> {
    let _span = trace_span!("subpixel", count = peaks.len()).entered();

    let mut out = Vec::with_capacity(peaks.len());
    let mut converged = 0usize;
    for peak in peaks {
        if response.index_of(&peak.position).is_none() {
            return Err(DogError::Localization {
                reason: format!(
                    "peak at {:?} lies outside the response volume {:?}",
                    peak.position,
                    response.dims()
                ),
            });
        }
        let refined = refine_peak(response, peak, max_moves);
        if refined.status == Refinement::Converged {
            converged += 1;
        }
        out.push(refined);
    }

    trace_event!(
        "subpixel_done",
        converged = converged,
        fallback = out.len() - converged
    );
    Ok(out)
}

fn refine_peak(response: VolumeView<'_, f32>, peak: Peak, max_moves: usize) -> RefinedPeak {
    let dims = response.dims();
    let mut base = peak.position.clone();
    let mut moves = 0usize;

    loop {
        let delta = match QuadraticFit::at(response, &base).maximum_offset() {
            Some(delta) => delta,
            None => return RefinedPeak::fallback(peak, Refinement::Degenerate),
        };

        if delta.iter().any(|d| d.abs() > 0.5) {
            if moves >= max_moves {
                return RefinedPeak::fallback(peak, Refinement::NotConverged);
            }
            let mut moved = false;
            for (axis, &d) in delta.iter().enumerate() {
                if d > 0.5 && base[axis] + 1 < dims[axis] {
                    base[axis] += 1;
                    moved = true;
                } else if d < -0.5 && base[axis] > 0 {
                    base[axis] -= 1;
                    moved = true;
                }
            }
            if !moved {
                return RefinedPeak::fallback(peak, Refinement::NotConverged);
            }
            moves += 1;
            continue;
        }

        let position: Vec<f64> = base
            .iter()
            .zip(&delta)
            .map(|(&b, &d)| b as f64 + d)
            .collect();
        let drifted = position
            .iter()
            .zip(&peak.position)
            .any(|(&p, &o)| (p - o as f64).abs() >= 1.0);
        if drifted {
            return RefinedPeak::fallback(peak, Refinement::NotConverged);
        }
        return RefinedPeak {
            peak,
            position,
            status: Refinement::Converged,
        };
    }
}
