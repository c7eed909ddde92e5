//! Optional denoising applied before the scale-space stage.
//!
//! The detector treats the pre-filter as a black box: it receives the `f32`
//! working copy of the input and returns a volume of identical extent, or an
//! error that aborts the whole detection call.

mod median;

pub use median::MedianFilter;

use crate::util::DogResult;
use crate::volume::{Volume, VolumeView};

/// Volume-to-volume filter run on the working image.
pub trait PreFilter: Send + Sync {
    /// Filters `input`; the output must have the same extent.
    fn apply(&self, input: VolumeView<'_, f32>) -> DogResult<Volume<f32>>;
}
