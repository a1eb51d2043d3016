//! Brightness and gamma adjustment on normalized pixel values.
//!
//! The tone stage works on a float copy of the Buffered image:
//!
//! 1. [`NormalizedBuffer::load`] divides every byte by 255
//! 2. [`apply_tone`] scales by brightness, clamps to 0..1, then raises to gamma
//! 3. [`NormalizedBuffer::store`] multiplies by 255 and truncates into Result
//!
//! Clamping happens before exponentiation. With brightness 1 and gamma 1 the
//! round trip is exact.

use crate::buffer::Image;

/// Tone adjustment parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    /// Brightness ratio (0 to 2)
    pub brightness: f32,
    /// Gamma exponent (0.04 to 25)
    pub gamma: f32,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            gamma: 1.0,
        }
    }
}

impl ToneParams {
    pub fn new(brightness: f32, gamma: f32) -> Self {
        Self { brightness, gamma }
    }

    /// Check if these parameters leave values unchanged.
    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.gamma == 1.0
    }
}

/// Apply brightness then gamma to a normalized value.
///
/// `0.0` stays `0.0` for every positive gamma.
#[inline]
pub fn apply_tone(value: f32, params: ToneParams) -> f32 {
    let clamped = (value * params.brightness).clamp(0.0, 1.0);
    if params.gamma == 1.0 {
        clamped
    } else {
        clamped.powf(params.gamma)
    }
}

/// Convert a normalized value back to a byte, truncating.
#[inline]
pub fn denormalize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// A pixel with normalized float channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct PixelF {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl PixelF {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Persistent float scratch buffer for the tone stage.
///
/// The allocation is only replaced when the image dimensions change.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBuffer {
    width: u32,
    height: u32,
    pixels: Vec<PixelF>,
}

impl NormalizedBuffer {
    /// Scratch buffer sized for a `width` x `height` image.
    pub fn new(width: u32, height: u32) -> Self {
        let mut buffer = Self::default();
        buffer.ensure_dimensions(width, height);
        buffer
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[PixelF] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [PixelF] {
        &mut self.pixels
    }

    /// Reallocate if the dimensions differ. Returns true if it did.
    pub fn ensure_dimensions(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height && !self.pixels.is_empty() {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![PixelF::default(); width as usize * height as usize];
        true
    }

    /// Normalize `image` into the buffer, dividing each channel by 255.
    pub fn load(&mut self, image: &Image) {
        self.ensure_dimensions(image.width(), image.height());
        for (dst, src) in self.pixels.iter_mut().zip(image.pixels()) {
            *dst = PixelF::new(
                src.r as f32 / 255.0,
                src.g as f32 / 255.0,
                src.b as f32 / 255.0,
                src.a as f32 / 255.0,
            );
        }
    }

    /// Write the buffer into `result`, taking dimensions and alpha from `buffered`.
    pub fn store(&self, buffered: &Image, result: &mut Image) {
        result.copy_from(buffered);
        for (dst, src) in result.pixels_mut().iter_mut().zip(&self.pixels) {
            dst.r = denormalize(src.r);
            dst.g = denormalize(src.g);
            dst.b = denormalize(src.b);
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::{BRIGHTNESS_MAX, GAMMA_MAX, GAMMA_MIN};
    use proptest::prelude::*;

    proptest! {
        /// Property: output always stays in 0..=1 and is never NaN.
        #[test]
        fn prop_output_in_unit_range(
            value in 0.0f32..=1.0,
            brightness in 0.0f32..=BRIGHTNESS_MAX,
            gamma in GAMMA_MIN..=GAMMA_MAX,
        ) {
            let out = apply_tone(value, ToneParams::new(brightness, gamma));
            prop_assert!(!out.is_nan());
            prop_assert!((0.0..=1.0).contains(&out));
        }

        /// Property: clamping happens before gamma is applied.
        #[test]
        fn prop_clamp_before_gamma(
            value in 0.0f32..=1.0,
            brightness in 0.0f32..=BRIGHTNESS_MAX,
            gamma in GAMMA_MIN..=GAMMA_MAX,
        ) {
            let expected = (value * brightness).clamp(0.0, 1.0).powf(gamma);
            let out = apply_tone(value, ToneParams::new(brightness, gamma));
            prop_assert!((out - expected).abs() <= 1e-6);
        }
    }
}
