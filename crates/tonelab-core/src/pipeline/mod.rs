//! Processing orchestration.
//!
//! [`Processor`] holds three image slots:
//! - Original: the decoded image, replaced only on load
//! - Buffered: Original after grayscale and histogram remapping
//! - Result: Buffered after brightness and gamma, read by the renderer
//!
//! Setters record what changed in [`DirtyFlags`]; [`Processor::tick`] runs
//! the matching [`Stage`]s in order.

mod processor;
mod stages;
mod types;

pub use processor::{Processor, ReferenceSelector};
pub use stages::{
    default_stages, Grayscale, HistogramRemap, PipelineState, RebuildBuffered, Stage, ToneAdjust,
};
pub use types::{DirtyFlags, ProcessError, ProcessorConfig, SelectionError, TickOutcome};
