//! Histogram matching against a reference image.
//!
//! Both images are equalized independently, then every source level is sent
//! to the reference level whose cumulative frequency first reaches it.

use crate::accel::Backend;
use crate::buffer::{Channel, Image, ImageError};
use crate::equalize::equalize;
use crate::lut::{ChannelLuts, RemapTable};
use crate::{Histogram, BIN_COUNT};

/// Build the inverse lookup tables sending `source` levels onto `reference`.
///
/// For level `i`, the scan walks down from bin 255 for as long as the
/// reference's normalized cumulative frequency is at least the source's at
/// `i`. The last bin passing the test is the match. Bin 255 always passes
/// since both sides reduce to the product of the totals there. When every
/// bin passes the scan stops at bin 0, which is the floor.
///
/// Frequencies are compared exactly by cross-multiplying with both totals.
///
/// # Errors
/// `Empty` if either histogram has no pixels in some channel.
pub fn matching_luts(source: &Histogram, reference: &Histogram) -> Result<ChannelLuts, ImageError> {
    let populated = |hist: &Histogram| Channel::ALL.iter().all(|&c| hist.channel_sum(c) > 0);
    if !populated(source) || !populated(reference) {
        return Err(ImageError::Empty);
    }

    Ok(ChannelLuts::from_fn(|channel| {
        let src_cum = source.cumulative(channel);
        let ref_cum = reference.cumulative(channel);
        let src_total = src_cum[BIN_COUNT - 1] as u128;
        let ref_total = ref_cum[BIN_COUNT - 1] as u128;

        let mut table = [0u8; BIN_COUNT];
        for (value, &level_cum) in table.iter_mut().zip(src_cum.iter()) {
            let target = level_cum as u128 * ref_total;
            let mut matched = BIN_COUNT - 1;
            while matched > 0 && ref_cum[matched - 1] as u128 * src_total >= target {
                matched -= 1;
            }
            *value = matched as u8;
        }
        RemapTable::new(table)
    }))
}

/// Match `source` against `reference` in place and return the new histogram.
///
/// `reference` is equalized on its own copy and left untouched. The two
/// equalizations run as a fork-join pair.
pub fn match_histograms(
    source: &mut Image,
    reference: &Image,
    backend: &dyn Backend,
) -> Result<Histogram, ImageError> {
    if source.is_empty() || reference.is_empty() {
        return Err(ImageError::Empty);
    }

    let mut reference = reference.clone();
    let (source_hist, reference_hist) = rayon::join(
        || equalize(source, backend),
        || equalize(&mut reference, backend),
    );
    let luts = matching_luts(&source_hist?, &reference_hist?)?;
    luts.apply(source);
    Ok(backend.histogram(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::ScalarBackend;
    use crate::buffer::Pixel;
    use crate::equalize::equalize;
    use crate::histogram::compute_histogram;

    fn image_with_levels(levels: &[u8]) -> Image {
        let pixels = levels.iter().map(|&v| Pixel::rgb(v, v, v)).collect();
        Image::from_pixels(levels.len() as u32, 1, pixels).unwrap()
    }

    #[test]
    fn test_self_match_is_identity_when_strictly_monotonic() {
        // Every level present: cumulative histogram strictly increasing
        let levels: Vec<u8> = (0..=255).collect();
        let hist = compute_histogram(&image_with_levels(&levels));
        let luts = matching_luts(&hist, &hist).unwrap();
        assert!(luts.is_identity());
    }

    #[test]
    fn test_self_match_is_identity_on_occupied_bins() {
        let img = image_with_levels(&[3, 3, 90, 200, 200, 200]);
        let hist = compute_histogram(&img);
        let luts = matching_luts(&hist, &hist).unwrap();
        for level in [3u8, 90, 200] {
            assert_eq!(luts.red.map(level), level);
        }
    }

    #[test]
    fn test_match_against_self_equals_equalize() {
        let img = image_with_levels(&[10, 10, 40, 80, 80, 80, 120, 250]);
        let backend = ScalarBackend::new(3);

        let mut equalized = img.clone();
        equalize(&mut equalized, &backend).unwrap();

        let mut matched = img.clone();
        let hist = match_histograms(&mut matched, &img, &backend).unwrap();
        assert_eq!(matched, equalized);
        assert!(hist.is_consistent(img.pixel_count()));
    }

    #[test]
    fn test_reference_is_not_mutated() {
        let reference = image_with_levels(&[0, 50, 100, 150]);
        let snapshot = reference.clone();
        let mut source = image_with_levels(&[20, 20, 20, 220]);
        match_histograms(&mut source, &reference, &ScalarBackend::default()).unwrap();
        assert_eq!(reference, snapshot);
    }

    #[test]
    fn test_lowest_bin_of_top_run() {
        // Reference mass: half at 64, half at 255
        let mut reference = Histogram::new();
        for table in [&mut reference.red, &mut reference.green, &mut reference.blue] {
            table[64] = 2;
            table[255] = 2;
        }
        reference.total = 4;

        // Source mass: quarter at 0, rest at 255
        let mut source = Histogram::new();
        for table in [&mut source.red, &mut source.green, &mut source.blue] {
            table[0] = 1;
            table[255] = 3;
        }
        source.total = 4;

        let luts = matching_luts(&source, &reference).unwrap();
        // src cdf(0) = 0.25, reference reaches it from bin 64 upward
        assert_eq!(luts.red.map(0), 64);
        // src cdf(255) = 1.0, only bin 255 reaches it
        assert_eq!(luts.red.map(255), 255);
        // src cdf(100) = 0.25
        assert_eq!(luts.green.map(100), 64);
    }

    #[test]
    fn test_scan_stops_at_bin_zero() {
        // Reference has mass at bin 0, so every bin passes for low source levels
        let reference = compute_histogram(&image_with_levels(&[0, 0, 0, 255]));
        let source = compute_histogram(&image_with_levels(&[5, 5, 5, 5]));
        let luts = matching_luts(&source, &reference).unwrap();
        // src cdf(0) = 0 is reached by every reference bin
        assert_eq!(luts.red.map(0), 0);
        // src cdf(5) = 1.0 is only reached at 255
        assert_eq!(luts.red.map(5), 255);
    }

    #[test]
    fn test_top_bin_always_matches() {
        // A full source cdf stops at the lowest bin where the reference is complete
        let reference = compute_histogram(&image_with_levels(&[0, 10, 20, 30]));
        let source = compute_histogram(&image_with_levels(&[200, 201, 202, 250]));
        let luts = matching_luts(&source, &reference).unwrap();
        assert_eq!(luts.red.map(250), 30);
        assert_eq!(luts.red.map(255), 30);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let hist = compute_histogram(&image_with_levels(&[1, 2]));
        assert_eq!(matching_luts(&Histogram::new(), &hist), Err(ImageError::Empty));

        let mut source = image_with_levels(&[1, 2]);
        let result = match_histograms(&mut source, &Image::default(), &ScalarBackend::default());
        assert_eq!(result, Err(ImageError::Empty));
        assert_eq!(source, image_with_levels(&[1, 2]));
    }
}
