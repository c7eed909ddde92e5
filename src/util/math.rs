//! Index and distance helpers shared by the filtering and refinement stages.

/// Reflects `index` into `[0, len)` without repeating the edge sample.
///
/// The reflection is periodic, so indices far outside a short axis still
/// land inside it: for `len = 4` the sequence `-3..=6` maps to
/// `3 2 1 0 1 2 3 2 1 0`.
pub(crate) fn mirror_index(index: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = index.rem_euclid(period);
    if m >= len as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// Squared Euclidean distance between two points of equal dimensionality.
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(p, q)| (p - q) * (p - q)).sum()
}
