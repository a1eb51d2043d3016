//! Processor WASM bindings.
//!
//! Wraps the core [`Processor`] for a browser front end. File dialogs do
//! not exist in WASM, so a matching reference is passed in as an already
//! decoded [`JsImage`] instead of being picked through a selector.
//!
//! # Example
//!
//! ```typescript
//! const processor = new JsProcessor();
//! processor.load(decode_image(bytes));
//!
//! processor.set_histogram_mode("equalize");
//! processor.set_brightness(1.2);
//! if (processor.tick() !== "idle") {
//!   const rgba = processor.result_pixels("rgba");
//!   ctx.putImageData(new ImageData(new Uint8ClampedArray(rgba), processor.width), 0, 0);
//! }
//! ```

use std::path::PathBuf;

use crate::histogram::JsHistogram;
use crate::types::{order_from_str, JsImage};
use tonelab_core::{
    AccelerationMode, HistogramMode, Processor, ProcessorConfig, ProcessingParams, TickOutcome,
};
use wasm_bindgen::prelude::*;

fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Parse an acceleration name: `"scalar"`, `"vector"` or `"external"`.
pub(crate) fn acceleration_from_str(name: &str) -> Option<AccelerationMode> {
    match name.to_ascii_lowercase().as_str() {
        "scalar" => Some(AccelerationMode::Scalar),
        "vector" => Some(AccelerationMode::Vector),
        "external" => Some(AccelerationMode::External),
        _ => None,
    }
}

/// Parse a histogram mode name: `"none"`, `"equalize"` or `"match"`.
pub(crate) fn histogram_mode_from_str(name: &str) -> Option<HistogramMode> {
    match name.to_ascii_lowercase().as_str() {
        "none" => Some(HistogramMode::None),
        "equalize" => Some(HistogramMode::Equalize),
        "match" => Some(HistogramMode::Match),
        _ => None,
    }
}

pub(crate) fn tick_outcome_name(outcome: TickOutcome) -> &'static str {
    match outcome {
        TickOutcome::Idle => "idle",
        TickOutcome::Restored => "restored",
        TickOutcome::Recomputed => "recomputed",
    }
}

/// Snapshot of the processor state handed to JS as a plain object.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusJs {
    has_image: bool,
    width: u32,
    height: u32,
    /// A tick would do work
    pending: bool,
    needs_rebuild: bool,
    restore_requested: bool,
    /// The external accelerator failed and the scalar path took over
    accelerator_fallback: bool,
}

/// Incremental histogram and tone processor.
#[wasm_bindgen]
pub struct JsProcessor {
    inner: Processor,
}

impl Default for JsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl JsProcessor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsProcessor {
        JsProcessor {
            inner: Processor::new(),
        }
    }

    /// Create a processor with explicit parallelism settings.
    ///
    /// `config` is a plain object like `{ toneBlocks: 6, histogramPartitions: 8 }`.
    /// Missing fields take their defaults.
    pub fn with_config(config: JsValue) -> Result<JsProcessor, JsValue> {
        let config: ProcessorConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        Ok(JsProcessor {
            inner: Processor::with_config(config),
        })
    }

    /// Register a new image. Resets every parameter except acceleration.
    ///
    /// On failure the previous image stays loaded.
    pub fn load(&mut self, image: &JsImage) -> Result<(), JsValue> {
        let image = image.to_image().map_err(to_js_error)?;
        self.inner.register_image(image).map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.inner.has_image()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.result().width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.result().height()
    }

    pub fn set_grayscale(&mut self, enabled: bool) {
        self.inner.set_grayscale(enabled);
    }

    /// Brightness ratio, clamped to 0..=2.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.inner.set_brightness(brightness);
    }

    /// Gamma exponent, clamped to 0.04..=25.
    pub fn set_gamma(&mut self, gamma: f32) {
        self.inner.set_gamma(gamma);
    }

    /// Select `"scalar"`, `"vector"` or `"external"`.
    pub fn set_acceleration(&mut self, name: &str) -> Result<(), JsValue> {
        let mode = acceleration_from_str(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown acceleration: {}", name)))?;
        self.inner.set_acceleration(mode);
        Ok(())
    }

    /// Select `"none"`, `"equalize"` or `"match"`.
    ///
    /// `"match"` needs `reference`. Without one the call fails and the
    /// current mode is kept. For the other modes `reference` is ignored.
    pub fn set_histogram_mode(
        &mut self,
        name: &str,
        reference: Option<JsImage>,
    ) -> Result<(), JsValue> {
        let mode = histogram_mode_from_str(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown histogram mode: {}", name)))?;

        if mode != HistogramMode::Match {
            let mut cancel = || -> Option<PathBuf> { None };
            return self
                .inner
                .set_histogram_mode(mode, &mut cancel)
                .map_err(to_js_error);
        }

        let reference = reference
            .map(|image| image.to_image())
            .transpose()
            .map_err(to_js_error)?;
        self.inner.use_reference_image(reference).map_err(|e| {
            web_sys::console::warn_1(&JsValue::from_str(&format!("Histogram match: {}", e)));
            to_js_error(e)
        })
    }

    /// Reset Result to Buffered and brightness/gamma to 1 on the next tick.
    pub fn request_restore(&mut self) {
        self.inner.request_restore();
    }

    /// Run one pipeline cycle.
    ///
    /// Returns `"idle"`, `"restored"` or `"recomputed"`.
    pub fn tick(&mut self) -> Result<String, JsValue> {
        self.inner
            .tick()
            .map(|outcome| tick_outcome_name(outcome).to_string())
            .map_err(to_js_error)
    }

    /// Result pixels as 4-byte pixels, `"rgba"` (default) or `"bgra"`.
    pub fn result_pixels(&self, order: &str) -> Vec<u8> {
        self.inner.result().to_bytes(order_from_str(order))
    }

    /// Result as an RGBA image.
    pub fn result_image(&self) -> JsImage {
        JsImage::from_image(self.inner.result(), order_from_str("rgba"))
    }

    /// Histogram of Buffered.
    pub fn histogram(&self) -> JsHistogram {
        JsHistogram::from(self.inner.histogram())
    }

    /// Current parameters as a plain object.
    pub fn params(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.params()).map_err(to_js_error)
    }

    /// Current state as a plain object:
    /// `{ hasImage, width, height, pending, needsRebuild, restoreRequested, acceleratorFallback }`.
    pub fn status(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.status_view()).map_err(to_js_error)
    }

    /// Apply a full parameter object.
    ///
    /// A parameter object carries no reference image, so entering
    /// `"Match"` this way fails. While already matching the current
    /// reference is kept.
    pub fn set_params(&mut self, params: JsValue) -> Result<(), JsValue> {
        let params: ProcessingParams = serde_wasm_bindgen::from_value(params)
            .map_err(|e| JsValue::from_str(&format!("Invalid params: {}", e)))?;
        self.inner.apply_params(params).map_err(to_js_error)
    }
}

impl JsProcessor {
    fn status_view(&self) -> StatusJs {
        let dirty = self.inner.dirty();
        StatusJs {
            has_image: self.inner.has_image(),
            width: self.inner.result().width(),
            height: self.inner.result().height(),
            pending: dirty.any(),
            needs_rebuild: dirty.needs_rebuild(),
            restore_requested: dirty.restore_requested,
            accelerator_fallback: self.inner.external_backend().has_reported_failure(),
        }
    }
}
