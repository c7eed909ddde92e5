//! Candidate extraction, spot assembly, and overlap suppression.

pub(crate) mod extrema;
pub(crate) mod spot;
pub(crate) mod suppress;
