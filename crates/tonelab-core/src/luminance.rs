//! Luma calculation using ITU-R BT.601 coefficients.
//!
//! This module provides the luma weights used by the grayscale stage of the
//! processing pipeline.

use rayon::prelude::*;

use crate::buffer::Image;

/// ITU-R BT.601 coefficient for red channel in luma calculation.
pub const LUMA_R: f32 = 0.299;

/// ITU-R BT.601 coefficient for green channel in luma calculation.
pub const LUMA_G: f32 = 0.587;

/// ITU-R BT.601 coefficient for blue channel in luma calculation.
pub const LUMA_B: f32 = 0.114;

/// Calculate luma from u8 RGB values (0 to 255).
///
/// # Arguments
/// * `r` - Red channel value (0-255)
/// * `g` - Green channel value (0-255)
/// * `b` - Blue channel value (0-255)
///
/// # Returns
/// Rounded luma value (0-255)
#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let luma = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
    luma.clamp(0.0, 255.0).round() as u8
}

/// Convert an image to grayscale in place.
///
/// The luma value is replicated into R, G and B. Alpha is untouched.
pub fn to_grayscale(image: &mut Image) {
    image.pixels_mut().par_iter_mut().for_each(|pixel| {
        let luma = luma_u8(pixel.r, pixel.g, pixel.b);
        pixel.r = luma;
        pixel.g = luma;
        pixel.b = luma;
    });
}
