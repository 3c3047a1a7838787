//! # Time-Windowed Smoothing
//!
//! Keeps roughly `period` worth of recent samples and exposes their average.
//! The window capacity follows the observed sample rate: after every push it
//! is retuned to `ceil(period / mean interval)`, clamped to
//! [`MIN_SMOOTHING_SAMPLES`]..=[`MAX_SMOOTHING_SAMPLES`].

use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::trace;

use super::average::{SlidingWindowAverage, WindowSample};

/// Lower bound for the auto-tuned window capacity.
pub const MIN_SMOOTHING_SAMPLES: usize = 2;

/// Upper bound for the auto-tuned window capacity.
pub const MAX_SMOOTHING_SAMPLES: usize = 120;

/// A window sample that carries the frame time it covers.
pub trait TimedSample: WindowSample {
    /// Frame time in seconds. For a window sum this is the buffered total.
    fn elapsed(&self) -> f64;
}

/// One stick reading plus its frame time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StickSample {
    pub x: f32,
    pub y: f32,
    pub elapsed: f64,
}

impl WindowSample for StickSample {
    fn zero() -> Self {
        Self::default()
    }

    fn plus(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            elapsed: self.elapsed + other.elapsed,
        }
    }

    fn minus(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            elapsed: self.elapsed - other.elapsed,
        }
    }

    fn div_count(self, count: usize) -> Self {
        Self {
            x: self.x / count as f32,
            y: self.y / count as f32,
            elapsed: self.elapsed / count as f64,
        }
    }
}

impl TimedSample for StickSample {
    fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// One trigger reading plus its frame time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TriggerSample {
    pub value: f32,
    pub elapsed: f64,
}

impl WindowSample for TriggerSample {
    fn zero() -> Self {
        Self::default()
    }

    fn plus(self, other: Self) -> Self {
        Self {
            value: self.value + other.value,
            elapsed: self.elapsed + other.elapsed,
        }
    }

    fn minus(self, other: Self) -> Self {
        Self {
            value: self.value - other.value,
            elapsed: self.elapsed - other.elapsed,
        }
    }

    fn div_count(self, count: usize) -> Self {
        Self {
            value: self.value / count as f32,
            elapsed: self.elapsed / count as f64,
        }
    }
}

impl TimedSample for TriggerSample {
    fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// Sliding window sized by time rather than by count.
#[derive(Debug, Clone)]
pub struct Smoother<S: TimedSample> {
    window: SlidingWindowAverage<S>,
    period: Duration,
}

impl<S: TimedSample> Smoother<S> {
    /// Creates an empty smoother covering `period`.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            window: SlidingWindowAverage::with_capacity(
                NonZeroUsize::MIN.saturating_add(MAX_SMOOTHING_SAMPLES - 1),
            ),
            period,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Changes the covered period. Buffered samples are trimmed on the next push.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Buffers a sample, retunes the capacity and trims to the period.
    pub fn push(&mut self, sample: S) {
        self.window.add(sample);

        let count = self.window.len();
        let mean_interval = self.window.sum().elapsed() / count as f64;
        if mean_interval > 0.0 {
            let wanted = (self.period.as_secs_f64() / mean_interval).ceil();
            let wanted = if wanted.is_finite() {
                (wanted as usize).clamp(MIN_SMOOTHING_SAMPLES, MAX_SMOOTHING_SAMPLES)
            } else {
                MAX_SMOOTHING_SAMPLES
            };
            let capacity = NonZeroUsize::MIN.saturating_add(wanted - 1);
            if capacity.get() != self.window.capacity() {
                trace!(
                    "smoothing window {} -> {} samples (mean interval {:.4}s)",
                    self.window.capacity(),
                    capacity,
                    mean_interval
                );
                self.window.resize(capacity);
            }
        }

        let period = self.period.as_secs_f64();
        self.window
            .remove_while(|_, sum| sum.elapsed() > period || sum.elapsed() <= 0.0);
    }

    /// Average of the buffered samples, or `None` if the window is empty.
    #[must_use]
    pub fn average(&self) -> Option<S> {
        if self.window.is_empty() {
            None
        } else {
            Some(self.window.average())
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(value: f32, ms: f64) -> TriggerSample {
        TriggerSample {
            value,
            elapsed: ms / 1000.0,
        }
    }

    #[test]
    fn test_capacity_follows_sample_rate() {
        // 1/64 s frames over a 1/8 s period
        let mut smoother = Smoother::new(Duration::from_micros(125_000));
        for _ in 0..20 {
            smoother.push(trigger(0.5, 15.625));
        }
        assert_eq!(smoother.capacity(), 8);
        assert_eq!(smoother.len(), 8);
    }

    #[test]
    fn test_capacity_clamped() {
        let mut fast = Smoother::new(Duration::from_secs(10));
        fast.push(trigger(0.0, 1.0));
        assert_eq!(fast.capacity(), MAX_SMOOTHING_SAMPLES);

        let mut slow = Smoother::new(Duration::from_millis(10));
        slow.push(trigger(0.0, 8.0));
        assert_eq!(slow.capacity(), MIN_SMOOTHING_SAMPLES);
    }

    #[test]
    fn test_window_averages_recent_samples() {
        // three 1/64 s frames fit the period exactly
        let mut smoother = Smoother::new(Duration::from_micros(46_875));
        for v in [0.0, 0.0, 0.0, 0.9, 0.9, 0.9] {
            smoother.push(trigger(v, 15.625));
        }
        assert_eq!(smoother.len(), 3);
        let average = smoother.average().expect("samples buffered");
        assert!((average.value - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_zero_time_samples_are_dropped() {
        let mut smoother = Smoother::new(Duration::from_millis(50));
        smoother.push(trigger(1.0, 0.0));
        assert!(smoother.average().is_none());
    }

    #[test]
    fn test_frame_longer_than_period_empties_window() {
        let mut smoother = Smoother::new(Duration::from_millis(50));
        smoother.push(trigger(0.2, 10.0));
        smoother.push(trigger(0.8, 80.0));
        assert!(smoother.is_empty());
        assert!(smoother.average().is_none());
    }

    #[test]
    fn test_stick_sample_arithmetic() {
        let a = StickSample { x: 0.5, y: -0.5, elapsed: 0.01 };
        let b = StickSample { x: 0.25, y: 0.5, elapsed: 0.03 };
        let avg = a.plus(b).div_count(2);
        assert!((avg.x - 0.375).abs() < 1e-6);
        assert_eq!(avg.y, 0.0);
        assert!((avg.elapsed() - 0.02).abs() < 1e-9);
        assert_eq!(a.plus(b).minus(b).x, a.x);
    }
}
