//! Calibrated spot records.

use crate::refine::RefinedPeak;
use crate::util::math::squared_distance;

/// Detected blob in physical coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Spot {
    /// Center in physical units (pixel coordinate times calibration).
    pub position: Vec<f64>,
    /// Ranking score; higher is better.
    pub quality: f64,
    /// Blob radius in physical units.
    pub radius: f64,
}

impl Spot {
    /// Squared Euclidean distance between two spot centers.
    pub fn squared_distance_to(&self, other: &Spot) -> f64 {
        squared_distance(&self.position, &other.position)
    }
}

/// Converts (possibly refined) peaks into calibrated spots.
///
/// Quality is the response at the discrete peak. The response stores
/// `blur(inner) - blur(outer)`, the negation of the conventional
/// `blur(outer) - blur(inner)` DoG value, so brighter blobs rank higher.
/// Every spot gets the same `radius`.
pub fn assemble_spots(peaks: &[RefinedPeak], calibration: &[f64], radius: f64) -> Vec<Spot> {
    peaks
        .iter()
        .map(|refined| {
            debug_assert_eq!(refined.position.len(), calibration.len());
            let position = refined
                .position
                .iter()
                .zip(calibration)
                .map(|(&p, &c)| p * c)
                .collect();
            Spot {
                position,
                quality: f64::from(refined.peak.value),
                radius,
            }
        })
        .collect()
}
