//! Interchangeable execution strategies for histogram reduction and tone.
//!
//! Every strategy implements [`Backend`] and must produce the same output as
//! [`ScalarBackend`]: exact for histograms, and exact for tone too since the
//! vectorized path performs the same f32 operations lane by lane.
//!
//! - [`ScalarBackend`]: per-channel histogram workers, plain tone loop
//! - [`VectorBackend`]: partitioned histogram, 4-lane tone loop
//! - [`ExternalBackend`]: delegates to an injected [`Accelerator`] and falls
//!   back to the scalar path if it fails

mod external;
mod scalar;
mod vector;

pub use external::{Accelerator, AcceleratorError, ExternalBackend, PooledAccelerator};
pub use scalar::ScalarBackend;
pub use vector::VectorBackend;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::Image;
use crate::pipeline::ProcessorConfig;
use crate::tone::{PixelF, ToneParams};
use crate::Histogram;

/// Strategy selector exposed on the configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccelerationMode {
    #[default]
    Scalar,
    Vector,
    External,
}

/// Histogram and tone kernels behind one strategy.
pub trait Backend: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Compute the histogram of `image`. Returns once every worker finished.
    fn histogram(&self, image: &Image) -> Histogram;

    /// Apply tone adjustment to every color channel of `pixels` in place.
    fn apply_tone(&self, pixels: &mut [PixelF], params: ToneParams);
}

/// The three strategies, owned together so switching is just a lookup.
pub struct Backends {
    scalar: ScalarBackend,
    vector: VectorBackend,
    external: ExternalBackend,
}

impl Backends {
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            scalar: ScalarBackend::new(config.tone_blocks),
            vector: VectorBackend::new(config.tone_blocks, config.histogram_partitions),
            external: ExternalBackend::new(ScalarBackend::new(config.tone_blocks)),
        }
    }

    pub fn select(&self, mode: AccelerationMode) -> &dyn Backend {
        match mode {
            AccelerationMode::Scalar => &self.scalar,
            AccelerationMode::Vector => &self.vector,
            AccelerationMode::External => &self.external,
        }
    }

    pub fn external(&self) -> &ExternalBackend {
        &self.external
    }

    pub fn external_mut(&mut self) -> &mut ExternalBackend {
        &mut self.external
    }
}

/// Pixels per block when splitting `len` pixels into `blocks` ranges.
pub(crate) fn block_len(len: usize, blocks: usize) -> usize {
    len.div_ceil(blocks.max(1)).max(1)
}

/// Run `kernel` over `blocks` contiguous pixel ranges as fork-join tasks.
pub(crate) fn for_each_block<F>(pixels: &mut [PixelF], blocks: usize, kernel: F)
where
    F: Fn(&mut [PixelF]) + Send + Sync,
{
    if pixels.is_empty() {
        return;
    }
    let chunk = block_len(pixels.len(), blocks);
    pixels.par_chunks_mut(chunk).for_each(kernel);
}
