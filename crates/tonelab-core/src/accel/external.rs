//! Externally accelerated strategy.
//!
//! [`ExternalBackend`] hands the work to an injected [`Accelerator`]. Any
//! failure, or a result that doesn't fit the input, makes that run fall back
//! to the scalar path. The first fallback is logged; later ones are silent
//! until a new accelerator is installed.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;
use tracing::warn;

use super::scalar::tone_block;
use super::{for_each_block, Backend, ScalarBackend};
use crate::buffer::Image;
use crate::histogram::compute_histogram_per_channel;
use crate::tone::{PixelF, ToneParams};
use crate::Histogram;

/// Errors reported by an [`Accelerator`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AcceleratorError {
    /// The device or runtime could not be reached
    #[error("Accelerator unavailable: {0}")]
    Unavailable(String),

    /// The kernel ran but did not complete
    #[error("Accelerator failed: {0}")]
    Failed(String),

    /// Returned buffer doesn't match the input
    #[error("Accelerator returned {actual} pixels, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// A histogram and tone implementation living outside the CPU scalar path.
pub trait Accelerator: Send + Sync {
    fn name(&self) -> &str;

    fn histogram(&self, image: &Image) -> Result<Histogram, AcceleratorError>;

    /// Return the toned copy of `pixels`. Alpha must be passed through.
    fn apply_tone(&self, pixels: &[PixelF], params: ToneParams) -> Result<Vec<PixelF>, AcceleratorError>;
}

/// Accelerator running the reference kernels on a dedicated thread pool.
pub struct PooledAccelerator {
    pool: ThreadPool,
    blocks: usize,
}

impl PooledAccelerator {
    /// Build a pool of `threads` workers. The tone loop is split into one
    /// block per worker.
    ///
    /// # Errors
    /// `Unavailable` if the pool cannot be started.
    pub fn new(threads: usize) -> Result<Self, AcceleratorError> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tonelab-accel-{i}"))
            .build()
            .map_err(|e| AcceleratorError::Unavailable(e.to_string()))?;
        Ok(Self {
            pool,
            blocks: threads,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Accelerator for PooledAccelerator {
    fn name(&self) -> &str {
        "rayon-pool"
    }

    fn histogram(&self, image: &Image) -> Result<Histogram, AcceleratorError> {
        Ok(self.pool.install(|| compute_histogram_per_channel(image)))
    }

    fn apply_tone(&self, pixels: &[PixelF], params: ToneParams) -> Result<Vec<PixelF>, AcceleratorError> {
        let mut out = pixels.to_vec();
        self.pool
            .install(|| for_each_block(&mut out, self.blocks, |block| tone_block(block, params)));
        Ok(out)
    }
}

/// [`Backend`] adapter around an optional [`Accelerator`].
pub struct ExternalBackend {
    accelerator: Option<Box<dyn Accelerator>>,
    fallback: ScalarBackend,
    reported: AtomicBool,
}

impl ExternalBackend {
    /// Backend with no accelerator installed; every run uses `fallback`.
    pub fn new(fallback: ScalarBackend) -> Self {
        Self {
            accelerator: None,
            fallback,
            reported: AtomicBool::new(false),
        }
    }

    /// Install (or remove) the accelerator and re-arm the failure report.
    pub fn set_accelerator(&mut self, accelerator: Option<Box<dyn Accelerator>>) {
        self.accelerator = accelerator;
        self.reported.store(false, Ordering::Relaxed);
    }

    pub fn accelerator_name(&self) -> Option<&str> {
        self.accelerator.as_deref().map(|a| a.name())
    }

    /// Check if a fallback has happened since the accelerator was installed.
    pub fn has_reported_failure(&self) -> bool {
        self.reported.load(Ordering::Relaxed)
    }

    fn report(&self, error: &AcceleratorError) {
        if !self.reported.swap(true, Ordering::Relaxed) {
            warn!(
                accelerator = self.accelerator_name().unwrap_or("none"),
                %error,
                "external accelerator failed, using scalar path"
            );
        }
    }

    fn missing() -> AcceleratorError {
        AcceleratorError::Unavailable("no accelerator installed".to_string())
    }
}

impl Backend for ExternalBackend {
    fn name(&self) -> &'static str {
        "external"
    }

    fn histogram(&self, image: &Image) -> Histogram {
        let outcome = match &self.accelerator {
            Some(accelerator) => accelerator.histogram(image).and_then(|hist| {
                if hist.is_consistent(image.pixel_count()) {
                    Ok(hist)
                } else {
                    Err(AcceleratorError::Failed(
                        "histogram totals do not match pixel count".to_string(),
                    ))
                }
            }),
            None => Err(Self::missing()),
        };

        match outcome {
            Ok(hist) => hist,
            Err(error) => {
                self.report(&error);
                self.fallback.histogram(image)
            }
        }
    }

    fn apply_tone(&self, pixels: &mut [PixelF], params: ToneParams) {
        if params.is_identity() {
            return;
        }

        let outcome = match &self.accelerator {
            Some(accelerator) => accelerator.apply_tone(pixels, params).and_then(|out| {
                if out.len() == pixels.len() {
                    Ok(out)
                } else {
                    Err(AcceleratorError::LengthMismatch {
                        expected: pixels.len(),
                        actual: out.len(),
                    })
                }
            }),
            None => Err(Self::missing()),
        };

        match outcome {
            Ok(out) => pixels.copy_from_slice(&out),
            Err(error) => {
                self.report(&error);
                self.fallback.apply_tone(pixels, params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Pixel;

    struct Broken;

    impl Accelerator for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn histogram(&self, _image: &Image) -> Result<Histogram, AcceleratorError> {
            Err(AcceleratorError::Failed("device lost".to_string()))
        }

        fn apply_tone(&self, _pixels: &[PixelF], _params: ToneParams) -> Result<Vec<PixelF>, AcceleratorError> {
            Ok(Vec::new())
        }
    }

    /// Returns a histogram with nothing counted.
    struct Lazy;

    impl Accelerator for Lazy {
        fn name(&self) -> &str {
            "lazy"
        }

        fn histogram(&self, _image: &Image) -> Result<Histogram, AcceleratorError> {
            Ok(Histogram::new())
        }

        fn apply_tone(&self, pixels: &[PixelF], _params: ToneParams) -> Result<Vec<PixelF>, AcceleratorError> {
            Ok(pixels.to_vec())
        }
    }

    fn sample() -> Image {
        let pixels = (0..12u8).map(|i| Pixel::rgb(i * 20, 255 - i, i)).collect();
        Image::from_pixels(4, 3, pixels).unwrap()
    }

    #[test]
    fn test_pooled_matches_scalar() {
        let img = sample();
        let mut backend = ExternalBackend::new(ScalarBackend::new(6));
        backend.set_accelerator(Some(Box::new(PooledAccelerator::new(2).unwrap())));
        assert_eq!(backend.accelerator_name(), Some("rayon-pool"));

        let scalar = ScalarBackend::new(6);
        assert_eq!(backend.histogram(&img), scalar.histogram(&img));

        let params = ToneParams::new(1.3, 2.2);
        let mut a = vec![PixelF::new(0.2, 0.6, 0.9, 1.0); 33];
        let mut b = a.clone();
        backend.apply_tone(&mut a, params);
        scalar.apply_tone(&mut b, params);
        assert_eq!(a, b);
        assert!(!backend.has_reported_failure());
    }

    #[test]
    fn test_failure_falls_back_and_reports_once() {
        let img = sample();
        let mut backend = ExternalBackend::new(ScalarBackend::new(2));
        backend.set_accelerator(Some(Box::new(Broken)));

        let hist = backend.histogram(&img);
        assert!(hist.is_consistent(img.pixel_count()));
        assert!(backend.has_reported_failure());

        // Length mismatch is also a failure
        let mut pixels = vec![PixelF::new(0.5, 0.5, 0.5, 1.0); 4];
        backend.apply_tone(&mut pixels, ToneParams::new(2.0, 1.0));
        assert_eq!(pixels[0].r, 1.0);

        backend.set_accelerator(Some(Box::new(Broken)));
        assert!(!backend.has_reported_failure());
    }

    #[test]
    fn test_inconsistent_histogram_is_rejected() {
        let img = sample();
        let mut backend = ExternalBackend::new(ScalarBackend::default());
        backend.set_accelerator(Some(Box::new(Lazy)));
        let hist = backend.histogram(&img);
        assert_eq!(hist, compute_histogram_per_channel(&img));
        assert!(backend.has_reported_failure());
    }

    #[test]
    fn test_no_accelerator_uses_fallback() {
        let backend = ExternalBackend::new(ScalarBackend::default());
        let mut pixels = vec![PixelF::new(0.25, 0.5, 1.0, 0.5)];
        backend.apply_tone(&mut pixels, ToneParams::new(2.0, 1.0));
        assert_eq!(pixels[0], PixelF::new(0.5, 1.0, 1.0, 0.5));
        assert!(backend.has_reported_failure());
    }

    #[test]
    fn test_pool_thread_count() {
        let accel = PooledAccelerator::new(0).unwrap();
        assert_eq!(accel.threads(), 1);
    }
}
