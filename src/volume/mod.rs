//! N-dimensional volume views and owned buffers.
//!
//! Samples are stored contiguously with axis 0 varying fastest, so for a 3D
//! stack `dims = [width, height, depth]` and the sample at `(x, y, z)` lives
//! at `x + width * (y + height * z)`. `VolumeView` borrows both the samples
//! and the extents; `Volume` owns them.

use crate::util::{DogError, DogResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Real-valued, orderable sample type that converts to the `f32` working
/// precision of the detector.
pub trait Sample: Copy + PartialOrd + Send + Sync + 'static {
    /// Converts the sample to the working floating-point precision.
    fn to_f32(self) -> f32;
}

macro_rules! impl_sample {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Sample for $ty {
                #[inline]
                fn to_f32(self) -> f32 {
                    self as f32
                }
            }
        )*
    };
}

impl_sample!(u8, u16, u32, i8, i16, i32, f32, f64);

/// Borrowed n-dimensional view into a contiguous buffer.
#[derive(Copy, Clone, Debug)]
pub struct VolumeView<'a, T> {
    data: &'a [T],
    dims: &'a [usize],
}

impl<'a, T> VolumeView<'a, T> {
    /// Creates a view; `data.len()` must equal the product of `dims`.
    pub fn new(data: &'a [T], dims: &'a [usize]) -> DogResult<Self> {
        let needed = element_count(dims)?;
        if data.len() != needed {
            return Err(DogError::BufferSizeMismatch {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { data, dims })
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Extent of every axis, axis 0 first.
    pub fn dims(&self) -> &'a [usize] {
        self.dims
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a validated view; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element strides per axis (axis 0 has stride 1).
    pub fn strides(&self) -> Vec<usize> {
        strides_for(self.dims)
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Linear index of `pos`, or `None` if it is out of bounds.
    pub fn index_of(&self, pos: &[usize]) -> Option<usize> {
        if pos.len() != self.dims.len() {
            return None;
        }
        let mut index = 0usize;
        let mut stride = 1usize;
        for (&p, &extent) in pos.iter().zip(self.dims) {
            if p >= extent {
                return None;
            }
            index += p * stride;
            stride *= extent;
        }
        Some(index)
    }

    /// Returns the sample at `pos` if it is within bounds.
    pub fn get(&self, pos: &[usize]) -> Option<&'a T> {
        self.index_of(pos).and_then(|idx| self.data.get(idx))
    }
}

impl<T: Sample> VolumeView<'_, T> {
    /// Copies the samples into a freshly allocated `f32` working volume.
    pub fn to_f32(&self) -> DogResult<Volume<f32>> {
        let mut out = Volume::try_zeros(self.dims)?;
        for (dst, &src) in out.data.iter_mut().zip(self.data) {
            *dst = src.to_f32();
        }
        Ok(out)
    }
}

/// Owned n-dimensional volume.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume<T> {
    data: Vec<T>,
    dims: Vec<usize>,
}

impl<T> Volume<T> {
    /// Wraps an existing buffer; `data.len()` must equal the product of `dims`.
    pub fn from_vec(data: Vec<T>, dims: Vec<usize>) -> DogResult<Self> {
        let needed = element_count(&dims)?;
        if data.len() != needed {
            return Err(DogError::BufferSizeMismatch {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { data, dims })
    }

    /// Returns a borrowed view of the volume.
    pub fn view(&self) -> VolumeView<'_, T> {
        VolumeView {
            data: &self.data,
            dims: &self.dims,
        }
    }

    /// Extent of every axis, axis 0 first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Samples in storage order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable samples in storage order.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the volume and returns its samples.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns the sample at `pos` if it is within bounds.
    pub fn get(&self, pos: &[usize]) -> Option<&T> {
        self.view().get(pos)
    }
}

impl<T: Clone> Volume<T> {
    /// Allocates a volume filled with `value`, reporting allocation failure
    /// as an error instead of aborting.
    pub fn filled(dims: &[usize], value: T) -> DogResult<Self> {
        let len = element_count(dims)?;
        Ok(Self {
            data: try_filled(len, value)?,
            dims: dims.to_vec(),
        })
    }
}

impl Volume<f32> {
    /// Allocates a zeroed working volume.
    pub fn try_zeros(dims: &[usize]) -> DogResult<Self> {
        Self::filled(dims, 0.0)
    }
}

/// Product of `dims`, validating that every extent is non-zero.
pub(crate) fn element_count(dims: &[usize]) -> DogResult<usize> {
    if dims.is_empty() || dims.contains(&0) {
        return Err(DogError::InvalidDimensions {
            dims: dims.to_vec(),
        });
    }
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| DogError::InvalidDimensions {
            dims: dims.to_vec(),
        })
}

pub(crate) fn strides_for(dims: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(dims.len());
    let mut stride = 1usize;
    for &extent in dims {
        strides.push(stride);
        stride *= extent;
    }
    strides
}

pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> DogResult<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| DogError::AllocationFailed { len })?;
    data.resize(len, value);
    Ok(data)
}

pub(crate) fn try_to_vec<T: Clone>(src: &[T]) -> DogResult<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(src.len())
        .map_err(|_| DogError::AllocationFailed { len: src.len() })?;
    data.extend_from_slice(src);
    Ok(data)
}
