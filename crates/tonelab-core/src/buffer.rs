//! Owned pixel buffers.
//!
//! An [`Image`] always stores four sub-channels per pixel, whatever the
//! source channel count was. Cloning produces an independent deep copy and
//! [`Image::take`] moves the pixels out, leaving an empty image behind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building or processing an [`Image`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Only 3 (RGB) and 4 (RGBA) channel sources are accepted.
    #[error("Unsupported channel count: {0} (expected 3 or 4)")]
    UnsupportedChannels(u8),

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// Byte buffer length doesn't match the dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Pixel count does not fit the 32-bit histogram counters.
    #[error("Image too large: {width}x{height}")]
    TooLarge { width: u32, height: u32 },

    /// The image holds no pixels (never loaded, or moved from).
    #[error("Image is empty")]
    Empty,
}

/// Color channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All color channels in table order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Position of the channel in [`Channel::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// Byte order used when flattening pixels for a presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelOrder {
    #[default]
    Rgba,
    Bgra,
}

/// A single 8-bit RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(C)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// Opaque pixel from color components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: u8::MAX }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn channel(self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    #[inline]
    pub fn set_channel(&mut self, channel: Channel, value: u8) {
        match channel {
            Channel::Red => self.r = value,
            Channel::Green => self.g = value,
            Channel::Blue => self.b = value,
        }
    }
}

/// A rectangular array of RGBA pixels in row-major order.
///
/// Invariant: `pixels.len() == width * height`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<Pixel>,
}

impl Image {
    /// Build an image from raw decoded bytes.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `channels` - Sub-channels per source pixel (3 or 4)
    /// * `bytes` - Row-major pixel data, `width * height * channels` bytes
    ///
    /// # Errors
    ///
    /// Rejects channel counts other than 3 or 4, zero dimensions, and buffers
    /// whose length doesn't match. A 3-channel source gets an opaque alpha.
    pub fn from_raw(width: u32, height: u32, channels: u8, bytes: &[u8]) -> Result<Self, ImageError> {
        if !(3..=4).contains(&channels) {
            return Err(ImageError::UnsupportedChannels(channels));
        }
        let expected = checked_byte_len(width, height, channels)?;
        if bytes.len() != expected {
            return Err(ImageError::InvalidPixelData {
                expected,
                actual: bytes.len(),
            });
        }

        let pixels = bytes
            .chunks_exact(channels as usize)
            .map(|chunk| match chunk {
                [r, g, b, a] => Pixel::rgba(*r, *g, *b, *a),
                _ => Pixel::rgb(chunk[0], chunk[1], chunk[2]),
            })
            .collect();

        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    /// Build an image from already-expanded pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self, ImageError> {
        let pixel_count = checked_pixel_count(width, height)?;
        if pixels.len() != pixel_count {
            return Err(ImageError::InvalidPixelData {
                expected: checked_byte_len(width, height, 4)?,
                actual: pixels.len().saturating_mul(4),
            });
        }
        Ok(Self {
            width,
            height,
            channels: 4,
            pixels,
        })
    }

    /// Image filled with a single pixel value.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self, ImageError> {
        let pixel_count = checked_pixel_count(width, height)?;
        Self::from_pixels(width, height, vec![pixel; pixel_count])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Channel count of the source the image was built from.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Check if this is an empty (unloaded or moved-from) image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Move the pixels out, leaving this image empty.
    pub fn take(&mut self) -> Image {
        std::mem::take(self)
    }

    /// Overwrite this image with a deep copy of `other`, reusing the allocation.
    pub fn copy_from(&mut self, other: &Image) {
        self.width = other.width;
        self.height = other.height;
        self.channels = other.channels;
        self.pixels.clear();
        self.pixels.extend_from_slice(&other.pixels);
    }

    /// Flatten to 4-byte pixels in the requested channel order.
    pub fn to_bytes(&self, order: ChannelOrder) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            match order {
                ChannelOrder::Rgba => bytes.extend_from_slice(&[pixel.r, pixel.g, pixel.b, pixel.a]),
                ChannelOrder::Bgra => bytes.extend_from_slice(&[pixel.b, pixel.g, pixel.r, pixel.a]),
            }
        }
        bytes
    }
}

fn checked_pixel_count(width: u32, height: u32) -> Result<usize, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions { width, height });
    }
    let count = width as u64 * height as u64;
    if count > u32::MAX as u64 {
        return Err(ImageError::TooLarge { width, height });
    }
    usize::try_from(count).map_err(|_| ImageError::TooLarge { width, height })
}

/// `width * height * channels` without wrapping on 32-bit targets.
fn checked_byte_len(width: u32, height: u32, channels: u8) -> Result<usize, ImageError> {
    checked_pixel_count(width, height)?
        .checked_mul(channels as usize)
        .ok_or(ImageError::TooLarge { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rgb_gets_opaque_alpha() {
        let bytes = vec![10, 20, 30, 40, 50, 60];
        let img = Image::from_raw(2, 1, 3, &bytes).unwrap();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.channels(), 3);
        assert_eq!(img.pixels(), &[Pixel::rgb(10, 20, 30), Pixel::rgb(40, 50, 60)]);
        assert_eq!(img.pixels()[0].a, 255);
    }

    #[test]
    fn test_from_raw_rgba_keeps_alpha() {
        let bytes = vec![1, 2, 3, 4];
        let img = Image::from_raw(1, 1, 4, &bytes).unwrap();
        assert_eq!(img.pixels()[0], Pixel::rgba(1, 2, 3, 4));
    }

    #[test]
    fn test_from_raw_rejects_gray() {
        let result = Image::from_raw(2, 2, 1, &[0; 4]);
        assert_eq!(result, Err(ImageError::UnsupportedChannels(1)));

        let result = Image::from_raw(2, 2, 2, &[0; 8]);
        assert_eq!(result, Err(ImageError::UnsupportedChannels(2)));
    }

    #[test]
    fn test_from_raw_rejects_zero_dimensions() {
        let result = Image::from_raw(0, 5, 3, &[]);
        assert_eq!(
            result,
            Err(ImageError::InvalidDimensions {
                width: 0,
                height: 5
            })
        );
    }

    #[test]
    fn test_from_raw_rejects_short_buffer() {
        let result = Image::from_raw(2, 2, 3, &[0; 11]);
        assert_eq!(
            result,
            Err(ImageError::InvalidPixelData {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn test_from_raw_byte_length_does_not_wrap() {
        // 2 * 715_827_883 * 3 is 2^32 + 2, which wraps to 2 in a 32-bit usize
        let result = Image::from_raw(2, 715_827_883, 3, &[0, 0]);
        match result {
            Err(ImageError::TooLarge { width, height }) => {
                assert_eq!((width, height), (2, 715_827_883));
            }
            Err(ImageError::InvalidPixelData { expected, actual }) => {
                assert_eq!(expected as u64, 4_294_967_298);
                assert_eq!(actual, 2);
            }
            other => panic!("oversized image accepted: {other:?}"),
        }
    }

    #[test]
    fn test_checked_byte_len() {
        assert_eq!(checked_byte_len(4, 3, 3), Ok(36));
        assert_eq!(
            checked_byte_len(0, 3, 4),
            Err(ImageError::InvalidDimensions { width: 0, height: 3 })
        );
        assert_eq!(
            checked_byte_len(u32::MAX, 2, 4),
            Err(ImageError::TooLarge { width: u32::MAX, height: 2 })
        );
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Image::filled(2, 2, Pixel::rgb(5, 5, 5)).unwrap();
        let mut copy = original.clone();
        copy.pixels_mut()[0] = Pixel::rgb(9, 9, 9);
        assert_eq!(original.pixels()[0], Pixel::rgb(5, 5, 5));
        assert_eq!(copy.pixels()[0], Pixel::rgb(9, 9, 9));
    }

    #[test]
    fn test_take_leaves_source_empty() {
        let mut source = Image::filled(3, 2, Pixel::rgb(1, 2, 3)).unwrap();
        let moved = source.take();
        assert!(source.is_empty());
        assert_eq!(source.dimensions(), (0, 0));
        assert_eq!(source.pixel_count(), 0);
        assert_eq!(moved.pixel_count(), 6);
    }

    #[test]
    fn test_copy_from_resizes() {
        let mut target = Image::filled(1, 1, Pixel::rgb(0, 0, 0)).unwrap();
        let source = Image::filled(4, 3, Pixel::rgb(7, 8, 9)).unwrap();
        target.copy_from(&source);
        assert_eq!(target, source);
    }

    #[test]
    fn test_to_bytes_orders() {
        let img = Image::from_pixels(1, 1, vec![Pixel::rgba(1, 2, 3, 4)]).unwrap();
        assert_eq!(img.to_bytes(ChannelOrder::Rgba), vec![1, 2, 3, 4]);
        assert_eq!(img.to_bytes(ChannelOrder::Bgra), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_pixel_channel_access() {
        let mut px = Pixel::rgb(10, 20, 30);
        assert_eq!(px.channel(Channel::Green), 20);
        px.set_channel(Channel::Blue, 99);
        assert_eq!(px.b, 99);
        assert_eq!(Channel::Blue.index(), 2);
    }

    #[test]
    fn test_error_display() {
        let err = ImageError::UnsupportedChannels(2);
        assert_eq!(err.to_string(), "Unsupported channel count: 2 (expected 3 or 4)");
    }
}
