//! 256-entry intensity remap tables.
//!
//! Equalization and matching both reduce to "build one table per channel,
//! then push every pixel through it". This module owns that last step.

use rayon::prelude::*;

use crate::buffer::{Channel, Image};
use crate::BIN_COUNT;

// ============================================================================
// LUT Type
// ============================================================================

/// Pre-computed lookup table for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapTable {
    /// LUT values: table[input] = output
    pub table: [u8; BIN_COUNT],
}

impl RemapTable {
    /// Wrap raw table values.
    pub fn new(table: [u8; BIN_COUNT]) -> Self {
        Self { table }
    }

    /// Create identity table (no change).
    pub fn identity() -> Self {
        let mut table = [0u8; BIN_COUNT];
        for (i, value) in table.iter_mut().enumerate() {
            *value = i as u8;
        }
        Self { table }
    }

    /// Check if this table is identity.
    pub fn is_identity(&self) -> bool {
        self.table.iter().enumerate().all(|(i, &v)| v == i as u8)
    }

    #[inline]
    pub fn map(&self, value: u8) -> u8 {
        self.table[value as usize]
    }
}

impl Default for RemapTable {
    fn default() -> Self {
        Self::identity()
    }
}

/// One remap table per color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelLuts {
    pub red: RemapTable,
    pub green: RemapTable,
    pub blue: RemapTable,
}

impl ChannelLuts {
    /// Build the three tables with a per-channel constructor.
    pub fn from_fn(mut build: impl FnMut(Channel) -> RemapTable) -> Self {
        Self {
            red: build(Channel::Red),
            green: build(Channel::Green),
            blue: build(Channel::Blue),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.red.is_identity() && self.green.is_identity() && self.blue.is_identity()
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Remap every pixel of `image` in place. Alpha is untouched.
    pub fn apply(&self, image: &mut Image) {
        // Early exit for identity
        if self.is_identity() {
            return;
        }

        image.pixels_mut().par_iter_mut().for_each(|pixel| {
            pixel.r = self.red.map(pixel.r);
            pixel.g = self.green.map(pixel.g);
            pixel.b = self.blue.map(pixel.b);
        });
    }
}
