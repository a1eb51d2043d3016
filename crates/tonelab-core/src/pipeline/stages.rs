//! Named pipeline stages.
//!
//! A tick runs every stage whose [`Stage::is_dirty`] returns true, in list
//! order. The default list is:
//!
//! 1. `rebuild-buffered`: Buffered := copy(Original)
//! 2. `grayscale`: luma conversion of Buffered when enabled
//! 3. `histogram-remap`: equalize or match Buffered, recompute the histogram
//! 4. `tone-adjust`: normalize, brightness/gamma, denormalize into Result
//!
//! The first three only run when a mode changed. Tone runs on any change.

use crate::accel::Backend;
use crate::buffer::Image;
use crate::equalize::equalize;
use crate::luminance::to_grayscale;
use crate::matching::match_histograms;
use crate::tone::NormalizedBuffer;
use crate::{Histogram, HistogramMode, ProcessingParams};

use super::types::{DirtyFlags, ProcessError};

/// Everything a stage may read or write during one tick.
pub struct PipelineState<'a> {
    pub params: &'a ProcessingParams,
    pub backend: &'a dyn Backend,
    pub original: &'a Image,
    pub reference: Option<&'a Image>,
    pub buffered: &'a mut Image,
    pub histogram: &'a mut Histogram,
    pub scratch: &'a mut NormalizedBuffer,
    pub result: &'a mut Image,
}

/// One step of the pipeline.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check if this stage has to run for the pending changes.
    fn is_dirty(&self, dirty: &DirtyFlags) -> bool;

    fn apply(&self, state: &mut PipelineState<'_>) -> Result<(), ProcessError>;
}

/// Copy Original into Buffered.
pub struct RebuildBuffered;

impl Stage for RebuildBuffered {
    fn name(&self) -> &'static str {
        "rebuild-buffered"
    }

    fn is_dirty(&self, dirty: &DirtyFlags) -> bool {
        dirty.needs_rebuild()
    }

    fn apply(&self, state: &mut PipelineState<'_>) -> Result<(), ProcessError> {
        state.buffered.copy_from(state.original);
        Ok(())
    }
}

/// Luma conversion of Buffered.
pub struct Grayscale;

impl Stage for Grayscale {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn is_dirty(&self, dirty: &DirtyFlags) -> bool {
        dirty.needs_rebuild()
    }

    fn apply(&self, state: &mut PipelineState<'_>) -> Result<(), ProcessError> {
        if state.params.grayscale {
            to_grayscale(state.buffered);
        }
        Ok(())
    }
}

/// Equalization or matching of Buffered. Always leaves a fresh histogram.
pub struct HistogramRemap;

impl Stage for HistogramRemap {
    fn name(&self) -> &'static str {
        "histogram-remap"
    }

    fn is_dirty(&self, dirty: &DirtyFlags) -> bool {
        dirty.needs_rebuild()
    }

    fn apply(&self, state: &mut PipelineState<'_>) -> Result<(), ProcessError> {
        *state.histogram = match state.params.histogram_mode {
            HistogramMode::None => state.backend.histogram(state.buffered),
            HistogramMode::Equalize => equalize(state.buffered, state.backend)?,
            HistogramMode::Match => {
                let reference = state.reference.ok_or(ProcessError::MissingReference)?;
                match_histograms(state.buffered, reference, state.backend)?
            }
        };
        Ok(())
    }
}

/// Brightness and gamma from Buffered into Result.
pub struct ToneAdjust;

impl Stage for ToneAdjust {
    fn name(&self) -> &'static str {
        "tone-adjust"
    }

    fn is_dirty(&self, dirty: &DirtyFlags) -> bool {
        dirty.any()
    }

    fn apply(&self, state: &mut PipelineState<'_>) -> Result<(), ProcessError> {
        // Identity tone round-trips every byte exactly
        if state.params.is_default_tone() {
            state.result.copy_from(state.buffered);
            return Ok(());
        }
        state.scratch.load(state.buffered);
        state
            .backend
            .apply_tone(state.scratch.pixels_mut(), state.params.tone());
        state.scratch.store(state.buffered, state.result);
        Ok(())
    }
}

/// The standard stage order.
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(RebuildBuffered),
        Box::new(Grayscale),
        Box::new(HistogramRemap),
        Box::new(ToneAdjust),
    ]
}
