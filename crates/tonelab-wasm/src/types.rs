//! WASM-compatible image type.
//!
//! JavaScript cannot hold Rust structs directly, so pixel data crosses the
//! boundary as a flat byte vector plus its dimensions and channel count.

use tonelab_core::buffer::{ChannelOrder, Image, ImageError};
use tonelab_core::decode::DecodedImage;
use wasm_bindgen::prelude::*;

/// A flat image accessible from JavaScript.
///
/// `pixels` holds `width * height * channels` bytes in row-major order.
/// Decoded files may carry 1 to 4 channels; only 3 and 4 can be loaded
/// into a processor.
///
/// # Memory Management
///
/// The pixel buffer lives in WASM memory. Call `free()` when the image is
/// no longer needed, or let the `FinalizationRegistry` collect it.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    /// Create an image from raw pixel data.
    ///
    /// No validation happens here. Mismatched lengths are reported when
    /// the image is loaded into a processor.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> JsImage {
        JsImage {
            width,
            height,
            channels,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel.
    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Copy of the pixel data as a `Uint8Array`.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly release WASM memory.
    pub fn free(self) {
        // Drop is automatic
    }
}

impl JsImage {
    pub(crate) fn from_decoded(decoded: DecodedImage) -> Self {
        Self {
            width: decoded.width,
            height: decoded.height,
            channels: decoded.channels,
            pixels: decoded.pixels,
        }
    }

    /// Always four channels, in `order`.
    pub(crate) fn from_image(image: &Image, order: ChannelOrder) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 4,
            pixels: image.to_bytes(order),
        }
    }

    pub(crate) fn to_image(&self) -> Result<Image, ImageError> {
        Image::from_raw(self.width, self.height, self.channels, &self.pixels)
    }
}

/// Parse a channel order name. Anything but `"bgra"` is RGBA.
pub(crate) fn order_from_str(order: &str) -> ChannelOrder {
    if order.eq_ignore_ascii_case("bgra") {
        ChannelOrder::Bgra
    } else {
        ChannelOrder::Rgba
    }
}
