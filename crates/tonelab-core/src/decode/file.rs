//! File decoding with EXIF orientation handling.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// Turns a file path into raw pixel bytes.
pub trait ImageDecoder: Send {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

/// Default decoder backed by the `image` crate (JPEG, PNG, BMP, GIF).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let bytes =
            fs::read(path).map_err(|e| DecodeError::IoError(format!("{}: {e}", path.display())))?;
        decode_bytes(&bytes)
    }
}

/// Decode an image from bytes, applying EXIF orientation correction.
///
/// Color images come back as 8-bit RGB or RGBA. Gray images keep their
/// 1 or 2 channel layout so callers can tell them apart.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format can't be recognized.
/// Returns `DecodeError::CorruptedFile` if the data is corrupted.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    // Extract EXIF orientation before decoding
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(into_decoded(apply_orientation(img, orientation)))
}

fn into_decoded(img: DynamicImage) -> DecodedImage {
    let (width, height) = (img.width(), img.height());
    let color = img.color();
    let (channels, pixels) = match (color.has_color(), color.has_alpha()) {
        (true, true) => (4, img.into_rgba8().into_raw()),
        (true, false) => (3, img.into_rgb8().into_raw()),
        (false, true) => (2, img.into_luma_alpha8().into_raw()),
        (false, false) => (1, img.into_luma8().into_raw()),
    };
    DecodedImage::new(width, height, channels, pixels)
}

/// Extract EXIF orientation from file bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let exif_reader = Reader::new();
    let mut cursor = Cursor::new(bytes);

    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
