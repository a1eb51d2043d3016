use super::{for_each_block, Backend};
use crate::buffer::Image;
use crate::histogram::compute_histogram_per_channel;
use crate::tone::{apply_tone, PixelF, ToneParams};
use crate::Histogram;

/// Reference strategy.
#[derive(Debug, Clone)]
pub struct ScalarBackend {
    tone_blocks: usize,
}

impl ScalarBackend {
    pub fn new(tone_blocks: usize) -> Self {
        Self {
            tone_blocks: tone_blocks.max(1),
        }
    }
}

impl Default for ScalarBackend {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Plain per-channel tone loop shared by the scalar path and the pooled accelerator.
pub(crate) fn tone_block(block: &mut [PixelF], params: ToneParams) {
    for pixel in block {
        pixel.r = apply_tone(pixel.r, params);
        pixel.g = apply_tone(pixel.g, params);
        pixel.b = apply_tone(pixel.b, params);
    }
}

impl Backend for ScalarBackend {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn histogram(&self, image: &Image) -> Histogram {
        compute_histogram_per_channel(image)
    }

    fn apply_tone(&self, pixels: &mut [PixelF], params: ToneParams) {
        // Early exit for identity
        if params.is_identity() {
            return;
        }
        for_each_block(pixels, self.tone_blocks, |block| tone_block(block, params));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_leaves_alpha() {
        let mut pixels = vec![PixelF::new(0.5, 0.5, 0.5, 0.3); 10];
        ScalarBackend::new(6).apply_tone(&mut pixels, ToneParams::new(2.0, 1.0));
        for p in &pixels {
            assert_eq!(p.r, 1.0);
            assert_eq!(p.a, 0.3);
        }
    }

    #[test]
    fn test_identity_is_noop() {
        let original = vec![PixelF::new(0.1, 0.2, 0.3, 1.0); 4];
        let mut pixels = original.clone();
        ScalarBackend::default().apply_tone(&mut pixels, ToneParams::default());
        assert_eq!(pixels, original);
    }
}
