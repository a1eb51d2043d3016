//! The dirty-flag driven processing state machine.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::accel::{AccelerationMode, Accelerator, Backends, ExternalBackend};
use crate::buffer::{Image, ImageError};
use crate::decode::{DecodedImage, FileDecoder, ImageDecoder};
use crate::tone::NormalizedBuffer;
use crate::{
    Histogram, HistogramMode, ProcessingParams, BRIGHTNESS_MAX, BRIGHTNESS_MIN, GAMMA_MAX,
    GAMMA_MIN,
};

use super::stages::{default_stages, PipelineState, Stage};
use super::types::{DirtyFlags, ProcessError, ProcessorConfig, SelectionError, TickOutcome};

/// Supplies the path of a reference image for histogram matching.
///
/// `None` means the user cancelled or the selection failed.
pub trait ReferenceSelector {
    fn select_reference(&mut self) -> Option<PathBuf>;
}

impl<F> ReferenceSelector for F
where
    F: FnMut() -> Option<PathBuf>,
{
    fn select_reference(&mut self) -> Option<PathBuf> {
        self()
    }
}

/// Owns the Original, Buffered and Result images and keeps Result up to date.
///
/// Configuration setters only mark what changed. [`Processor::tick`] does
/// the work, blocking until every stage has finished.
pub struct Processor {
    config: ProcessorConfig,
    params: ProcessingParams,
    dirty: DirtyFlags,
    original: Image,
    buffered: Image,
    result: Image,
    histogram: Histogram,
    scratch: NormalizedBuffer,
    reference: Option<Image>,
    backends: Backends,
    stages: Vec<Box<dyn Stage>>,
    decoder: Box<dyn ImageDecoder>,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    pub fn new() -> Self {
        Self::with_config(ProcessorConfig::default())
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        let config = ProcessorConfig {
            tone_blocks: config.tone_blocks.max(1),
            histogram_partitions: config.histogram_partitions.max(1),
        };
        Self {
            config,
            params: ProcessingParams::default(),
            dirty: DirtyFlags::default(),
            original: Image::default(),
            buffered: Image::default(),
            result: Image::default(),
            histogram: Histogram::new(),
            scratch: NormalizedBuffer::default(),
            reference: None,
            backends: Backends::new(&config),
            stages: default_stages(),
            decoder: Box::new(FileDecoder),
        }
    }

    /// Replace the decoder used by [`open`](Self::open) and reference selection.
    pub fn with_decoder(mut self, decoder: impl ImageDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Install the accelerator behind [`AccelerationMode::External`].
    pub fn set_accelerator(&mut self, accelerator: Option<Box<dyn Accelerator>>) {
        self.backends.external_mut().set_accelerator(accelerator);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Decode `path` and register it as the new image.
    ///
    /// On failure the previously loaded image and all buffers are untouched.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), ProcessError> {
        let decoded = self.decoder.decode(path.as_ref())?;
        self.register_decoded(&decoded)
    }

    pub fn register_decoded(&mut self, decoded: &DecodedImage) -> Result<(), ProcessError> {
        let image = Image::try_from(decoded)?;
        self.register_image(image)
    }

    /// Make `image` the new Original.
    ///
    /// All parameters except acceleration go back to their defaults, the
    /// matching reference is dropped, and Buffered, the histogram and Result
    /// are rebuilt before returning.
    pub fn register_image(&mut self, image: Image) -> Result<(), ProcessError> {
        if image.is_empty() {
            return Err(ProcessError::Image(ImageError::Empty));
        }

        self.params = ProcessingParams {
            acceleration: self.params.acceleration,
            ..ProcessingParams::default()
        };
        self.reference = None;
        self.scratch.ensure_dimensions(image.width(), image.height());
        self.original = image;

        self.buffered.copy_from(&self.original);
        self.histogram = self
            .backends
            .select(self.params.acceleration)
            .histogram(&self.buffered);
        self.result.copy_from(&self.buffered);
        self.dirty.clear();

        info!(
            width = self.original.width(),
            height = self.original.height(),
            channels = self.original.channels(),
            "image registered"
        );
        Ok(())
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn set_grayscale(&mut self, enabled: bool) {
        if self.params.grayscale != enabled {
            self.params.grayscale = enabled;
            self.dirty.mode_changed = true;
        }
    }

    pub fn set_acceleration(&mut self, mode: AccelerationMode) {
        if self.params.acceleration != mode {
            self.params.acceleration = mode;
            self.dirty.mode_changed = true;
        }
    }

    /// Set the brightness ratio, clamped to 0..=2. NaN is ignored.
    pub fn set_brightness(&mut self, brightness: f32) {
        if brightness.is_nan() {
            return;
        }
        let brightness = brightness.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
        if self.params.brightness != brightness {
            self.params.brightness = brightness;
            self.dirty.adjustment_changed = true;
        }
    }

    /// Set the gamma exponent, clamped to 0.04..=25. NaN is ignored.
    pub fn set_gamma(&mut self, gamma: f32) {
        if gamma.is_nan() {
            return;
        }
        let gamma = gamma.clamp(GAMMA_MIN, GAMMA_MAX);
        if self.params.gamma != gamma {
            self.params.gamma = gamma;
            self.dirty.adjustment_changed = true;
        }
    }

    /// Ask the next tick to reset Result to Buffered and tone to defaults.
    ///
    /// The restore clears every dirty flag, including a grayscale,
    /// acceleration or histogram mode change made since the last tick. The
    /// new parameter value is kept but Buffered is not rebuilt for it, and
    /// setting the same value again is a no-op. Tick before restoring, or
    /// toggle the parameter, to bring Buffered back in line.
    pub fn request_restore(&mut self) {
        self.dirty.restore_requested = true;
    }

    /// Switch the histogram mode.
    ///
    /// Switching to [`HistogramMode::Match`] asks `selector` for a reference
    /// path and decodes it. If that fails the mode stays as it was and no
    /// buffer is touched.
    pub fn set_histogram_mode(
        &mut self,
        mode: HistogramMode,
        selector: &mut dyn ReferenceSelector,
    ) -> Result<(), SelectionError> {
        if mode == self.params.histogram_mode {
            return Ok(());
        }
        if mode == HistogramMode::Match {
            let reference = self
                .load_reference(selector)
                .inspect_err(|error| warn!(%error, "reference selection aborted"))?;
            return self.use_reference_image(Some(reference));
        }
        self.switch_histogram_mode(mode);
        Ok(())
    }

    /// Match against an already decoded reference image.
    ///
    /// `None` is treated as a cancelled selection.
    pub fn use_reference_image(&mut self, reference: Option<Image>) -> Result<(), SelectionError> {
        if self.original.is_empty() {
            return Err(SelectionError::NoImage);
        }
        let reference = reference.ok_or(SelectionError::Cancelled)?;
        if reference.is_empty() {
            return Err(SelectionError::InvalidReference(ImageError::Empty));
        }
        self.reference = Some(reference);
        self.switch_histogram_mode(HistogramMode::Match);
        // A new reference needs a rebuild even if the mode was already Match
        self.dirty.histogram_mode_changed = true;
        Ok(())
    }

    /// Apply a full parameter set, e.g. restored from a front end.
    ///
    /// Values are sanitized first. A parameter set carries no reference
    /// image, so entering Match from another mode fails with `NoReference`
    /// and nothing changes; use [`set_histogram_mode`](Self::set_histogram_mode)
    /// or [`use_reference_image`](Self::use_reference_image) for that. While
    /// already in Match the current reference is kept.
    pub fn apply_params(&mut self, params: ProcessingParams) -> Result<(), SelectionError> {
        let params = params.sanitized();
        // Leaving Match drops the reference, so outside Match there is none
        if params.histogram_mode == HistogramMode::Match
            && self.params.histogram_mode != HistogramMode::Match
        {
            return Err(SelectionError::NoReference);
        }

        self.set_grayscale(params.grayscale);
        self.set_acceleration(params.acceleration);
        self.set_brightness(params.brightness);
        self.set_gamma(params.gamma);
        if params.histogram_mode != self.params.histogram_mode {
            self.switch_histogram_mode(params.histogram_mode);
        }
        Ok(())
    }

    fn load_reference(&self, selector: &mut dyn ReferenceSelector) -> Result<Image, SelectionError> {
        if self.original.is_empty() {
            return Err(SelectionError::NoImage);
        }
        let path = selector.select_reference().ok_or(SelectionError::Cancelled)?;
        let decoded = self.decoder.decode(&path)?;
        Ok(Image::try_from(&decoded)?)
    }

    fn switch_histogram_mode(&mut self, mode: HistogramMode) {
        if mode != self.params.histogram_mode {
            info!(from = ?self.params.histogram_mode, to = ?mode, "histogram mode changed");
            self.params.histogram_mode = mode;
            self.dirty.histogram_mode_changed = true;
        }
        if mode != HistogramMode::Match {
            self.reference = None;
        }
    }

    // ========================================================================
    // Recompute
    // ========================================================================

    /// Run one pipeline cycle for whatever changed since the last tick.
    ///
    /// A pending restore wins over everything else in the same tick. Dirty
    /// flags are cleared afterwards, also when a stage fails.
    pub fn tick(&mut self) -> Result<TickOutcome, ProcessError> {
        if !self.dirty.any() {
            return Ok(TickOutcome::Idle);
        }
        if self.original.is_empty() {
            self.dirty.clear();
            return Ok(TickOutcome::Idle);
        }

        if self.dirty.restore_requested {
            self.result.copy_from(&self.buffered);
            self.params.brightness = 1.0;
            self.params.gamma = 1.0;
            self.dirty.clear();
            debug!("restored defaults");
            return Ok(TickOutcome::Restored);
        }

        let dirty = self.dirty;
        self.dirty.clear();

        let backend = self.backends.select(self.params.acceleration);
        let mut state = PipelineState {
            params: &self.params,
            backend,
            original: &self.original,
            reference: self.reference.as_ref(),
            buffered: &mut self.buffered,
            histogram: &mut self.histogram,
            scratch: &mut self.scratch,
            result: &mut self.result,
        };
        for stage in self.stages.iter().filter(|stage| stage.is_dirty(&dirty)) {
            debug!(stage = stage.name(), backend = backend.name(), "running stage");
            stage.apply(&mut state)?;
        }

        debug!(?dirty, "recomputed");
        Ok(TickOutcome::Recomputed)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn params(&self) -> &ProcessingParams {
        &self.params
    }

    pub fn dirty(&self) -> &DirtyFlags {
        &self.dirty
    }

    pub fn has_image(&self) -> bool {
        !self.original.is_empty()
    }

    pub fn original(&self) -> &Image {
        &self.original
    }

    pub fn buffered(&self) -> &Image {
        &self.buffered
    }

    /// The image the render consumer should display.
    pub fn result(&self) -> &Image {
        &self.result
    }

    /// Histogram of Buffered as of the last rebuild.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn reference(&self) -> Option<&Image> {
        self.reference.as_ref()
    }

    pub fn external_backend(&self) -> &ExternalBackend {
        self.backends.external()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}
