//! Types shared by the processing pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::ImageError;
use crate::decode::DecodeError;

/// Configuration categories changed since the last recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyFlags {
    /// Grayscale or acceleration changed
    pub mode_changed: bool,
    /// Histogram mode or matching reference changed
    pub histogram_mode_changed: bool,
    /// Brightness or gamma changed
    pub adjustment_changed: bool,
    /// Restore defaults requested
    pub restore_requested: bool,
}

impl DirtyFlags {
    pub fn any(&self) -> bool {
        self.mode_changed
            || self.histogram_mode_changed
            || self.adjustment_changed
            || self.restore_requested
    }

    /// Check if Buffered has to be rebuilt from Original.
    pub fn needs_rebuild(&self) -> bool {
        self.mode_changed || self.histogram_mode_changed
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What a call to [`Processor::tick`](super::Processor::tick) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was dirty, or there is no image.
    Idle,
    /// Result was reset to Buffered and tone defaults restored.
    Restored,
    /// The dirty stages ran and Result was recomputed.
    Recomputed,
}

/// Parallelism settings for the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorConfig {
    /// Pixel-range blocks for the tone loop (0 is treated as 1)
    pub tone_blocks: usize,
    /// Spatial partitions for the vectorized histogram reducer
    pub histogram_partitions: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            tone_blocks: 6,
            histogram_partitions: 8,
        }
    }
}

/// Reasons a switch to histogram matching was aborted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The selector returned no path.
    #[error("Reference selection cancelled")]
    Cancelled,

    /// Matching needs a loaded source image first.
    #[error("No image loaded")]
    NoImage,

    /// No reference image is available for matching.
    #[error("No reference image available")]
    NoReference,

    #[error("Failed to decode reference image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid reference image: {0}")]
    InvalidReference(#[from] ImageError),
}

/// Errors from loading an image or running the pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] DecodeError),

    #[error("Invalid image: {0}")]
    Image(#[from] ImageError),

    #[error("Histogram matching requires a reference image")]
    MissingReference,
}
