//! Decoder collaborator for Tonelab.
//!
//! The processing engine only needs `(width, height, channels, bytes)` for a
//! path. This module defines that boundary ([`ImageDecoder`]) and ships a
//! default implementation on top of the `image` crate that also honors EXIF
//! orientation.
//!
//! # Examples
//!
//! ```ignore
//! use tonelab_core::decode::{FileDecoder, ImageDecoder};
//!
//! let image = FileDecoder.decode("photo.jpg".as_ref()).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod file;
mod types;

pub use file::{decode_bytes, FileDecoder, ImageDecoder};
pub use types::{DecodeError, DecodedImage, Orientation};
