//! Tonelab WASM - WebAssembly bindings for Tonelab
//!
//! This crate exposes the tonelab-core processing engine to
//! JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper type for image data
//! - `decode` - Image decoding bindings
//! - `histogram` - Per-channel histogram bindings
//! - `processor` - The incremental processor (equalize, match, brightness, gamma)
//!
//! # Usage
//!
//! ```typescript
//! import init, { decode_image, JsProcessor } from '@tonelab/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const processor = new JsProcessor();
//! processor.load(decode_image(bytes));
//! processor.set_gamma(0.8);
//! processor.tick();
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod histogram;
mod processor;
mod types;

// Re-export public types
pub use decode::decode_image;
pub use histogram::{compute_histogram, JsHistogram};
pub use processor::JsProcessor;
pub use types::JsImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
