//! Histogram reduction over an [`Image`].
//!
//! Three reducers are provided. They all produce identical tables:
//!
//! - [`compute_histogram`]: single pass, single thread. Used as the reference.
//! - [`compute_histogram_per_channel`]: one worker per color channel, each
//!   scanning the full pixel array into its own table.
//! - [`compute_histogram_partitioned`]: the pixel array is split into
//!   contiguous ranges, each worker fills interleaved partial tables and the
//!   partials are merged at the end.
//!
//! The parallel reducers only return once every worker has finished.

use rayon::prelude::*;

use crate::buffer::{Channel, Image, Pixel};
use crate::{Histogram, BIN_COUNT};

/// Partial tables kept per worker by the partitioned reducer.
const INTERLEAVE: usize = 4;

/// Compute RGB histograms from an image in a single pass.
///
/// # Performance
/// O(n) in the number of pixels. Memory usage is constant (3KB for bins).
pub fn compute_histogram(image: &Image) -> Histogram {
    let mut hist = Histogram::new();
    for pixel in image.pixels() {
        hist.red[pixel.r as usize] += 1;
        hist.green[pixel.g as usize] += 1;
        hist.blue[pixel.b as usize] += 1;
    }
    hist.total = image.pixel_count() as u32;
    hist
}

/// Compute RGB histograms with one fork-join worker per channel.
///
/// Every worker reads the whole pixel array but writes only its own table,
/// so there is no write contention.
pub fn compute_histogram_per_channel(image: &Image) -> Histogram {
    let pixels = image.pixels();
    let tables: Vec<(Channel, [u32; BIN_COUNT])> = Channel::ALL
        .par_iter()
        .map(|&channel| (channel, channel_table(pixels, channel)))
        .collect();

    let mut hist = Histogram::new();
    for (channel, table) in tables {
        *hist.channel_mut(channel) = table;
    }
    hist.total = image.pixel_count() as u32;
    hist
}

/// Compute RGB histograms by splitting the pixels into `partitions` ranges.
///
/// A partition count of 0 is treated as 1.
pub fn compute_histogram_partitioned(image: &Image, partitions: usize) -> Histogram {
    let pixels = image.pixels();
    if pixels.is_empty() {
        return Histogram::new();
    }

    let partitions = partitions.max(1);
    let chunk_len = pixels.len().div_ceil(partitions);

    pixels
        .par_chunks(chunk_len)
        .map(partial_histogram)
        .reduce(Histogram::new, |mut acc, part| {
            acc.merge(&part);
            acc
        })
}

fn channel_table(pixels: &[Pixel], channel: Channel) -> [u32; BIN_COUNT] {
    let mut table = [0u32; BIN_COUNT];
    for pixel in pixels {
        table[pixel.channel(channel) as usize] += 1;
    }
    table
}

/// Fill `INTERLEAVE` sub-tables round-robin, then fold them together.
///
/// Consecutive pixels usually share a value; spreading them over separate
/// tables keeps successive increments off the same counter.
fn partial_histogram(pixels: &[Pixel]) -> Histogram {
    let mut parts: [Histogram; INTERLEAVE] = std::array::from_fn(|_| Histogram::new());

    let mut quads = pixels.chunks_exact(INTERLEAVE);
    for quad in &mut quads {
        for (part, pixel) in parts.iter_mut().zip(quad) {
            part.red[pixel.r as usize] += 1;
            part.green[pixel.g as usize] += 1;
            part.blue[pixel.b as usize] += 1;
        }
    }
    for (part, pixel) in parts.iter_mut().zip(quads.remainder()) {
        part.red[pixel.r as usize] += 1;
        part.green[pixel.g as usize] += 1;
        part.blue[pixel.b as usize] += 1;
    }

    let [mut hist, rest @ ..] = parts;
    for part in &rest {
        hist.merge(part);
    }
    hist.total = pixels.len() as u32;
    hist
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_from_rgb(width: u32, height: u32, bytes: &[u8]) -> Image {
        Image::from_raw(width, height, 3, bytes).unwrap()
    }

    #[test]
    fn test_empty_image() {
        let img = Image::default();
        assert_eq!(compute_histogram(&img), Histogram::new());
        assert_eq!(compute_histogram_per_channel(&img), Histogram::new());
        assert_eq!(compute_histogram_partitioned(&img, 4), Histogram::new());
    }

    #[test]
    fn test_single_red_pixel() {
        let img = image_from_rgb(1, 1, &[255, 0, 0]);
        let hist = compute_histogram(&img);
        assert_eq!(hist.red[255], 1);
        assert_eq!(hist.green[0], 1);
        assert_eq!(hist.blue[0], 1);
        assert_eq!(hist.total, 1);
    }

    #[test]
    fn test_rgb_primary_colors() {
        let img = image_from_rgb(
            3,
            1,
            &[
                255, 0, 0, // Red
                0, 255, 0, // Green
                0, 0, 255, // Blue
            ],
        );
        let hist = compute_histogram_per_channel(&img);
        assert_eq!(hist.red[255], 1);
        assert_eq!(hist.red[0], 2);
        assert_eq!(hist.green[255], 1);
        assert_eq!(hist.green[0], 2);
        assert_eq!(hist.blue[255], 1);
        assert_eq!(hist.blue[0], 2);
    }

    #[test]
    fn test_alpha_is_ignored() {
        let img = Image::from_raw(2, 1, 4, &[10, 20, 30, 0, 10, 20, 30, 255]).unwrap();
        let hist = compute_histogram(&img);
        assert_eq!(hist.red[10], 2);
        assert_eq!(hist.green[20], 2);
        assert_eq!(hist.blue[30], 2);
    }

    #[test]
    fn test_two_by_two_black_white() {
        let img = image_from_rgb(2, 2, &[0, 0, 0, 255, 255, 255, 0, 0, 0, 255, 255, 255]);
        for hist in [
            compute_histogram(&img),
            compute_histogram_per_channel(&img),
            compute_histogram_partitioned(&img, 3),
        ] {
            for channel in Channel::ALL {
                let table = hist.channel(channel);
                assert_eq!(table[0], 2);
                assert_eq!(table[255], 2);
                assert_eq!(hist.channel_sum(channel), 4);
            }
        }
    }

    #[test]
    fn test_large_image() {
        // 100x100 image = 10,000 pixels
        let img = image_from_rgb(100, 100, &vec![128u8; 100 * 100 * 3]);
        let hist = compute_histogram_partitioned(&img, 8);
        assert_eq!(hist.red[128], 10_000);
        assert_eq!(hist.green[128], 10_000);
        assert_eq!(hist.blue[128], 10_000);
        assert_eq!(hist.total, 10_000);
        assert_eq!(hist.max_value(), 10_000);
    }

    #[test]
    fn test_gradient_image() {
        let mut bytes = Vec::new();
        for i in 0..=255u8 {
            bytes.extend_from_slice(&[i, i, i]);
        }
        let img = image_from_rgb(256, 1, &bytes);
        let hist = compute_histogram_per_channel(&img);

        // Each bin should have exactly 1 pixel
        for i in 0..BIN_COUNT {
            assert_eq!(hist.red[i], 1);
            assert_eq!(hist.green[i], 1);
            assert_eq!(hist.blue[i], 1);
        }
        assert_eq!(hist.max_value(), 1);
    }

    #[test]
    fn test_more_partitions_than_pixels() {
        let img = image_from_rgb(2, 1, &[1, 2, 3, 4, 5, 6]);
        let hist = compute_histogram_partitioned(&img, 64);
        assert_eq!(hist, compute_histogram(&img));
    }

    #[test]
    fn test_zero_partitions() {
        let img = image_from_rgb(3, 1, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(compute_histogram_partitioned(&img, 0), compute_histogram(&img));
    }
}
