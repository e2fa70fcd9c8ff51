//! Warm-up aware trailing average of frame times.

use std::time::Duration;

use crate::options::FrameStatsOptions;

/// Trailing-average frame time sampler.
///
/// Ignores frames until a warm-up delay has passed, seeds the average with
/// the first frame after it, then blends each new frame time in with a
/// small fixed weight.
#[derive(Debug, Clone)]
pub struct FrameStats {
    warmup: Duration,
    smoothing: f32,
    waited: Duration,
    /// Trailing average in milliseconds, `None` while warming up.
    trailing_ms: Option<f32>,
    current_ms: f32,
    samples: u64,
}

impl FrameStats {
    /// Create a sampler from options.
    #[must_use]
    pub fn new(options: &FrameStatsOptions) -> Self {
        let warmup = if options.warmup_seconds.is_finite() {
            Duration::from_secs_f32(options.warmup_seconds.clamp(0.0, 3600.0))
        } else {
            Duration::ZERO
        };
        let smoothing = if options.smoothing.is_finite() {
            options.smoothing.clamp(0.0, 1.0)
        } else {
            FrameStatsOptions::default().smoothing
        };
        Self {
            warmup,
            smoothing,
            waited: Duration::ZERO,
            trailing_ms: None,
            current_ms: 0.0,
            samples: 0,
        }
    }

    /// Feed one frame's duration. Returns `true` once samples are being
    /// collected.
    pub fn record(&mut self, delta: Duration) -> bool {
        let delta_ms = delta.as_secs_f32() * 1000.0;
        match self.trailing_ms {
            None => {
                self.waited += delta;
                if self.waited > self.warmup {
                    self.trailing_ms = Some(delta_ms);
                    self.current_ms = delta_ms;
                    self.samples = 1;
                    true
                } else {
                    false
                }
            }
            Some(avg) => {
                self.trailing_ms =
                    Some(avg + (delta_ms - avg) * self.smoothing);
                self.current_ms = delta_ms;
                self.samples += 1;
                true
            }
        }
    }

    /// Trailing average frame time in milliseconds.
    #[must_use]
    pub fn trailing_ms(&self) -> Option<f32> {
        self.trailing_ms
    }

    /// Most recent frame time in milliseconds.
    #[must_use]
    pub fn current_ms(&self) -> f32 {
        self.current_ms
    }

    /// Frames per second implied by the trailing average.
    #[must_use]
    pub fn fps(&self) -> Option<f32> {
        self.trailing_ms
            .filter(|ms| *ms > 0.0)
            .map(|ms| 1000.0 / ms)
    }

    /// Frames sampled since warm-up ended.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Three-line summary, or `None` while warming up.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let trailing = self.trailing_ms?;
        let fps = self.fps().unwrap_or(0.0);
        Some(format!(
            "trailing avg (ms) {trailing:.2}\n\
             current frame (ms) {:.2}\n\
             FPS {fps:.0}",
            self.current_ms
        ))
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(&FrameStatsOptions::default())
    }
}
