//! Tonelab Core - histogram and tone processing engine
//!
//! This crate provides the processing core behind the Tonelab image viewer:
//! the pixel buffer, histogram reduction, equalization and matching,
//! brightness/gamma tone adjustment, interchangeable acceleration backends,
//! and the dirty-flag driven [`Processor`] that sequences them.

pub mod accel;
pub mod buffer;
pub mod decode;
pub mod equalize;
pub mod histogram;
pub mod luminance;
pub mod lut;
pub mod matching;
pub mod pipeline;
pub mod tone;

pub use accel::{AccelerationMode, Accelerator, AcceleratorError, Backend, PooledAccelerator};
pub use buffer::{Channel, ChannelOrder, Image, ImageError, Pixel};
pub use lut::{ChannelLuts, RemapTable};
pub use pipeline::{
    DirtyFlags, ProcessError, Processor, ProcessorConfig, ReferenceSelector, SelectionError,
    TickOutcome,
};
pub use tone::{NormalizedBuffer, PixelF, ToneParams};

use serde::{Deserialize, Serialize};

/// Number of bins in each channel table.
pub const BIN_COUNT: usize = 256;

/// Lowest accepted brightness ratio.
pub const BRIGHTNESS_MIN: f32 = 0.0;
/// Highest accepted brightness ratio.
pub const BRIGHTNESS_MAX: f32 = 2.0;
/// Lowest accepted gamma exponent.
pub const GAMMA_MIN: f32 = 0.04;
/// Highest accepted gamma exponent.
pub const GAMMA_MAX: f32 = 25.0;

/// Histogram remapping applied when Buffered is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistogramMode {
    /// Leave intensities untouched.
    #[default]
    None,
    /// Flatten each channel through its CDF.
    Equalize,
    /// Follow the equalized histogram of a reference image.
    Match,
}

/// User-facing processing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingParams {
    /// Convert Buffered to luma before histogram remapping
    pub grayscale: bool,
    /// Histogram remapping mode
    pub histogram_mode: HistogramMode,
    /// Execution strategy for the reducer and tone loop
    pub acceleration: AccelerationMode,
    /// Brightness ratio (0 to 2)
    pub brightness: f32,
    /// Gamma exponent (0.04 to 25)
    pub gamma: f32,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            grayscale: false,
            histogram_mode: HistogramMode::None,
            acceleration: AccelerationMode::Scalar,
            brightness: 1.0,
            gamma: 1.0,
        }
    }
}

impl ProcessingParams {
    /// Create parameters with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Tone parameters handed to the tone engine.
    pub fn tone(&self) -> ToneParams {
        ToneParams::new(self.brightness, self.gamma)
    }

    /// Return a copy with brightness and gamma clamped into their domains.
    ///
    /// NaN falls back to the default of 1.0.
    pub fn sanitized(self) -> Self {
        Self {
            brightness: clamp_or_default(self.brightness, BRIGHTNESS_MIN, BRIGHTNESS_MAX),
            gamma: clamp_or_default(self.gamma, GAMMA_MIN, GAMMA_MAX),
            ..self
        }
    }

    /// Check if brightness and gamma are at their defaults
    pub fn is_default_tone(&self) -> bool {
        self.brightness == 1.0 && self.gamma == 1.0
    }
}

fn clamp_or_default(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(min, max)
    }
}

/// Per-channel frequency tables of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    /// Red channel histogram (256 bins)
    pub red: [u32; BIN_COUNT],
    /// Green channel histogram (256 bins)
    pub green: [u32; BIN_COUNT],
    /// Blue channel histogram (256 bins)
    pub blue: [u32; BIN_COUNT],
    /// Number of pixels the tables were computed from
    pub total: u32,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            red: [0; BIN_COUNT],
            green: [0; BIN_COUNT],
            blue: [0; BIN_COUNT],
            total: 0,
        }
    }
}

impl Histogram {
    /// Create a new empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for one channel.
    pub fn channel(&self, channel: Channel) -> &[u32; BIN_COUNT] {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    /// Mutable table for one channel.
    pub fn channel_mut(&mut self, channel: Channel) -> &mut [u32; BIN_COUNT] {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }

    /// Sum of all bins of one channel.
    pub fn channel_sum(&self, channel: Channel) -> u64 {
        self.channel(channel).iter().map(|&count| count as u64).sum()
    }

    /// Running sum of one channel's bins, `cumulative[i] = sum(bins[0..=i])`.
    pub fn cumulative(&self, channel: Channel) -> [u64; BIN_COUNT] {
        let mut cumulative = [0u64; BIN_COUNT];
        let mut running = 0u64;
        for (slot, &count) in cumulative.iter_mut().zip(self.channel(channel).iter()) {
            running += count as u64;
            *slot = running;
        }
        cumulative
    }

    /// Check that every channel accounts for exactly `pixel_count` pixels.
    pub fn is_consistent(&self, pixel_count: usize) -> bool {
        self.total as usize == pixel_count
            && Channel::ALL
                .iter()
                .all(|&channel| self.channel_sum(channel) == pixel_count as u64)
    }

    /// Add another histogram's counts into this one.
    pub fn merge(&mut self, other: &Histogram) {
        for channel in Channel::ALL {
            let theirs = other.channel(channel);
            for (mine, &count) in self.channel_mut(channel).iter_mut().zip(theirs.iter()) {
                *mine += count;
            }
        }
        self.total += other.total;
    }

    /// Find the maximum value across all channels for normalization
    pub fn max_value(&self) -> u32 {
        let max_r = *self.red.iter().max().unwrap_or(&0);
        let max_g = *self.green.iter().max().unwrap_or(&0);
        let max_b = *self.blue.iter().max().unwrap_or(&0);
        max_r.max(max_g).max(max_b)
    }
}
