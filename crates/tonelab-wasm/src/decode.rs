//! Image decoding WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! import { decode_image } from '@tonelab/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! console.log(`Decoded ${image.width}x${image.height}, ${image.channels} channels`);
//! ```

use crate::types::JsImage;
use tonelab_core::decode;
use wasm_bindgen::prelude::*;

/// Decode a PNG, JPEG, BMP or GIF file from bytes.
///
/// EXIF orientation is applied. The channel count follows the file, so
/// grayscale files come back with 1 or 2 channels.
///
/// # Errors
///
/// Returns an error if the format is not recognized or the data is corrupt.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsImage, JsValue> {
    decode::decode_bytes(bytes)
        .map(JsImage::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}


/// Error paths return `JsValue` and only run on wasm32 targets.
/// Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_decode_empty_bytes() {
        assert!(decode_image(&[]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_garbage() {
        assert!(decode_image(&[0x00, 0x01, 0x02, 0x03]).is_err());
    }
}
