//! Histogram WASM bindings.
//!
//! Exposes the per-channel histogram kept by the processor, plus a
//! standalone reducer for arbitrary pixel data.

use crate::types::JsImage;
use tonelab_core::histogram::compute_histogram_partitioned;
use tonelab_core::Histogram;
use wasm_bindgen::prelude::*;

/// Histogram result accessible from JavaScript.
///
/// Contains 256-bin histograms for the red, green and blue channels.
#[wasm_bindgen]
pub struct JsHistogram {
    red: Vec<u32>,
    green: Vec<u32>,
    blue: Vec<u32>,
    total: u32,
    max_value: u32,
}

#[wasm_bindgen]
impl JsHistogram {
    /// Get red channel histogram (256 bins).
    pub fn red(&self) -> Vec<u32> {
        self.red.clone()
    }

    /// Get green channel histogram (256 bins).
    pub fn green(&self) -> Vec<u32> {
        self.green.clone()
    }

    /// Get blue channel histogram (256 bins).
    pub fn blue(&self) -> Vec<u32> {
        self.blue.clone()
    }

    /// Number of pixels counted in each channel.
    #[wasm_bindgen(getter)]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Get maximum bin value across all channels.
    ///
    /// Useful for normalizing histogram display.
    #[wasm_bindgen(getter)]
    pub fn max_value(&self) -> u32 {
        self.max_value
    }
}

impl From<&Histogram> for JsHistogram {
    fn from(hist: &Histogram) -> Self {
        Self {
            red: hist.red.to_vec(),
            green: hist.green.to_vec(),
            blue: hist.blue.to_vec(),
            total: hist.total,
            max_value: hist.max_value(),
        }
    }
}

/// Compute the histogram of an RGB or RGBA image.
///
/// # Example (TypeScript)
/// ```typescript
/// const hist = compute_histogram(image, 8);
/// const redBins = hist.red();        // Uint32Array[256]
/// const max = hist.max_value;        // For normalization
/// hist.free();
/// ```
#[wasm_bindgen]
pub fn compute_histogram(image: &JsImage, partitions: usize) -> Result<JsHistogram, JsValue> {
    let image = image
        .to_image()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(JsHistogram::from(&compute_histogram_partitioned(
        &image, partitions,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_histogram_from_core() {
        let mut hist = Histogram::new();
        hist.red[255] = 3;
        hist.green[0] = 3;
        hist.blue[128] = 2;
        hist.blue[64] = 1;
        hist.total = 3;

        let js = JsHistogram::from(&hist);
        assert_eq!(js.red().len(), 256);
        assert_eq!(js.red()[255], 3);
        assert_eq!(js.blue()[64], 1);
        assert_eq!(js.total(), 3);
        assert_eq!(js.max_value(), 3);
    }

    #[test]
    fn test_compute_histogram_gradient() {
        let mut pixels = Vec::new();
        for i in 0..=255u8 {
            pixels.extend_from_slice(&[i, i, 255 - i]);
        }
        let image = JsImage::new(256, 1, 3, pixels);
        let hist = compute_histogram(&image, 4).ok().unwrap();

        for i in 0..256 {
            assert_eq!(hist.red()[i], 1);
            assert_eq!(hist.blue()[i], 1);
        }
        assert_eq!(hist.total(), 256);
        assert_eq!(hist.max_value(), 1);
    }
}
