//! Convenience helpers for loading 2D frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::util::{DogError, DogResult};
use crate::volume::Volume;
use std::path::Path;

/// Creates an owned 8-bit volume from a grayscale image buffer.
pub fn owned_from_gray_image(img: &image::GrayImage) -> DogResult<Volume<u8>> {
    let dims = vec![img.width() as usize, img.height() as usize];
    Volume::from_vec(img.as_raw().clone(), dims)
}

/// Creates an owned 16-bit volume from a grayscale image buffer.
pub fn owned_from_gray16_image(
    img: &image::ImageBuffer<image::Luma<u16>, Vec<u16>>,
) -> DogResult<Volume<u16>> {
    let dims = vec![img.width() as usize, img.height() as usize];
    Volume::from_vec(img.as_raw().clone(), dims)
}

/// Loads an image from disk and converts it to an 8-bit grayscale volume.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> DogResult<Volume<u8>> {
    let img = open(path)?;
    owned_from_gray_image(&img.to_luma8())
}

/// Loads an image from disk keeping up to 16 bits of grayscale depth.
///
/// Microscopy frames are usually 12- or 16-bit; this avoids the quantization
/// that `load_gray_image` applies.
pub fn load_gray16_image<P: AsRef<Path>>(path: P) -> DogResult<Volume<u16>> {
    let img = open(path)?;
    owned_from_gray16_image(&img.to_luma16())
}

fn open<P: AsRef<Path>>(path: P) -> DogResult<image::DynamicImage> {
    image::open(path).map_err(|err| DogError::ImageIo {
        reason: err.to_string(),
    })
}
