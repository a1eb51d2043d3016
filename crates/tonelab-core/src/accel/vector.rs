//! Vectorized strategy.
//!
//! One [`PixelF`] is exactly one 128-bit vector, so the brightness multiply
//! and the clamp run on all four lanes at once:
//! - x86_64 SSE2: `_mm_mul_ps` / `_mm_max_ps` / `_mm_min_ps`
//! - everything else: a `[f32; 4]` lane loop the compiler can auto-vectorize
//!
//! Gamma is applied per lane with `powf`, identical to the scalar path.

use super::{for_each_block, Backend};
use crate::buffer::Image;
use crate::histogram::compute_histogram_partitioned;
use crate::tone::{PixelF, ToneParams};
use crate::Histogram;

/// Partitioned histogram plus a 4-lane tone kernel.
#[derive(Debug, Clone)]
pub struct VectorBackend {
    tone_blocks: usize,
    partitions: usize,
}

impl VectorBackend {
    pub fn new(tone_blocks: usize, partitions: usize) -> Self {
        Self {
            tone_blocks: tone_blocks.max(1),
            partitions: partitions.max(1),
        }
    }
}

impl Default for VectorBackend {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Backend for VectorBackend {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn histogram(&self, image: &Image) -> Histogram {
        compute_histogram_partitioned(image, self.partitions)
    }

    fn apply_tone(&self, pixels: &mut [PixelF], params: ToneParams) {
        if params.is_identity() {
            return;
        }
        for_each_block(pixels, self.tone_blocks, |block| {
            scale_clamp_block(block, params.brightness);
            if params.gamma != 1.0 {
                for pixel in block.iter_mut() {
                    pixel.r = pixel.r.powf(params.gamma);
                    pixel.g = pixel.g.powf(params.gamma);
                    pixel.b = pixel.b.powf(params.gamma);
                }
            }
        });
    }
}

/// Multiply color lanes by `brightness` and clamp them to 0..1. Alpha is kept.
#[cfg(all(target_arch = "x86_64", target_feature = "sse2", not(miri)))]
fn scale_clamp_block(block: &mut [PixelF], brightness: f32) {
    use std::arch::x86_64::*;

    // SAFETY: `PixelF` is `#[repr(C)]` with four f32 fields, so each pixel is
    // 16 contiguous bytes. Unaligned loads and stores are used throughout.
    unsafe {
        // Lanes are listed high to low: alpha multiplier is 1.
        let scale = _mm_set_ps(1.0, brightness, brightness, brightness);
        let zero = _mm_setzero_ps();
        let one = _mm_set1_ps(1.0);

        for pixel in block.iter_mut() {
            let alpha = pixel.a;
            let ptr = pixel as *mut PixelF as *mut f32;
            let v = _mm_loadu_ps(ptr);
            let v = _mm_min_ps(_mm_max_ps(_mm_mul_ps(v, scale), zero), one);
            _mm_storeu_ps(ptr, v);
            pixel.a = alpha;
        }
    }
}

/// Portable lane fallback.
#[cfg(not(all(target_arch = "x86_64", target_feature = "sse2", not(miri))))]
fn scale_clamp_block(block: &mut [PixelF], brightness: f32) {
    let scale = [brightness, brightness, brightness, 1.0];
    for pixel in block.iter_mut() {
        let mut lanes = [pixel.r, pixel.g, pixel.b, pixel.a];
        for (lane, s) in lanes.iter_mut().zip(scale) {
            *lane = (*lane * s).clamp(0.0, 1.0);
        }
        pixel.r = lanes[0];
        pixel.g = lanes[1];
        pixel.b = lanes[2];
    }
}
