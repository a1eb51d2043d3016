//! Core types for image decoding.

use thiserror::Error;

use crate::buffer::{Image, ImageError};

/// Error types for image decoding operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// I/O error during file reading.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Raw decoder output: interleaved 8-bit samples plus their layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Samples per pixel (1 gray, 2 gray + alpha, 3 RGB, 4 RGBA).
    pub channels: u8,
    /// Pixel data in row-major order.
    /// Length should be width * height * channels.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Create a new DecodedImage with the given layout and pixel data.
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

impl TryFrom<&DecodedImage> for Image {
    type Error = ImageError;

    fn try_from(decoded: &DecodedImage) -> Result<Self, Self::Error> {
        Image::from_raw(decoded.width, decoded.height, decoded.channels, &decoded.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Pixel;

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal); // Invalid defaults to Normal
    }

    #[test]
    fn test_decoded_image_creation() {
        let img = DecodedImage::new(100, 50, 3, vec![0u8; 100 * 50 * 3]);
        assert_eq!(img.byte_size(), 15000);
        assert!(!img.is_empty());
    }

    #[test]
    fn test_decoded_image_empty() {
        let img = DecodedImage::new(0, 0, 3, vec![]);
        assert!(img.is_empty());
    }

    #[test]
    fn test_into_image() {
        let decoded = DecodedImage::new(1, 1, 3, vec![9, 8, 7]);
        let img = Image::try_from(&decoded).unwrap();
        assert_eq!(img.pixels(), &[Pixel::rgb(9, 8, 7)]);
    }

    #[test]
    fn test_gray_is_rejected() {
        let decoded = DecodedImage::new(2, 1, 1, vec![0, 255]);
        assert_eq!(Image::try_from(&decoded), Err(ImageError::UnsupportedChannels(1)));
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::IoError("missing.png".to_string());
        assert_eq!(err.to_string(), "I/O error: missing.png");

        let err = DecodeError::InvalidFormat;
        assert_eq!(err.to_string(), "Invalid or unsupported image format");
    }
}
