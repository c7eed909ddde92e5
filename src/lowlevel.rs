//! Low-level building blocks for custom detection pipelines.
//!
//! These are the individual stages that `Detector::detect` chains together.
//! Most users should prefer `Detector` or the top-level `detect`.

pub use crate::candidate::extrema::{find_extrema, select_maxima};
pub use crate::candidate::spot::assemble_spots;
pub use crate::candidate::suppress::suppress_overlapping;
pub use crate::kernel::{GaussianKernel1D, LineKernel};
pub use crate::refine::localize_subpixel;
pub use crate::scalespace::{
    derive_scales, difference_of_gaussian, gaussian_blur, MirrorExpWindow,
};
