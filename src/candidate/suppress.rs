//! Greedy overlap suppression.

use crate::candidate::spot::Spot;
use crate::trace::{trace_event, trace_span};
use std::cmp::Ordering;

fn quality_desc(a: &Spot, b: &Spot) -> Ordering {
    match (a.quality.is_nan(), b.quality.is_nan()) {
        (false, false) => b.quality.total_cmp(&a.quality),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    }
}

/// Removes spots that touch a better spot.
///
/// Spots are sorted by descending quality with a stable sort, so ties keep
/// their input order, and accepted greedily: a spot survives only if its
/// center is farther than `radius_self + radius_other` from every spot
/// already accepted. The output is ordered by descending quality.
pub fn suppress_overlapping(mut spots: Vec<Spot>) -> Vec<Spot> {
    let _span = trace_span!("suppress", count = spots.len()).entered();
    let total = spots.len();

    spots.sort_by(quality_desc);
    let mut kept: Vec<Spot> = Vec::with_capacity(spots.len());

    'outer: for spot in spots {
        for accepted in &kept {
            let reach = spot.radius + accepted.radius;
            if spot.squared_distance_to(accepted) <= reach * reach {
                continue 'outer;
            }
        }
        kept.push(spot);
    }

    trace_event!("suppressed", before = total, after = kept.len());
    kept
}
