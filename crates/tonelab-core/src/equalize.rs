//! Per-channel histogram equalization.
//!
//! For each channel, bin `i` maps to `round(255 * cumulative(i) / pixel_count)`.
//! The histogram is rescanned from the remapped pixels afterwards. Deriving it
//! from the table would be wrong whenever two input bins land on the same
//! output bin.

use crate::accel::Backend;
use crate::buffer::{Image, ImageError};
use crate::lut::{ChannelLuts, RemapTable};
use crate::{Histogram, BIN_COUNT};

/// Build the equalization tables for `hist`.
///
/// # Errors
/// `Empty` if `pixel_count` is zero.
pub fn equalization_luts(hist: &Histogram, pixel_count: usize) -> Result<ChannelLuts, ImageError> {
    if pixel_count == 0 {
        return Err(ImageError::Empty);
    }
    let n = pixel_count as f64;

    Ok(ChannelLuts::from_fn(|channel| {
        let cumulative = hist.cumulative(channel);
        let mut table = [0u8; BIN_COUNT];
        for (value, &count) in table.iter_mut().zip(cumulative.iter()) {
            let cdf = count as f64 / n;
            *value = (255.0 * cdf).round().clamp(0.0, 255.0) as u8;
        }
        RemapTable::new(table)
    }))
}

/// Equalize `image` in place and return its recomputed histogram.
pub fn equalize(image: &mut Image, backend: &dyn Backend) -> Result<Histogram, ImageError> {
    if image.is_empty() {
        return Err(ImageError::Empty);
    }
    let hist = backend.histogram(image);
    let luts = equalization_luts(&hist, image.pixel_count())?;
    luts.apply(image);
    Ok(backend.histogram(image))
}
