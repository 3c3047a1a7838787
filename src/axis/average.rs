//! # Sliding Window Average
//!
//! Running average over the most recent samples, with a capacity that can
//! change at runtime.
//!
//! ```
//! use gamepad_dynamics::axis::SlidingWindowAverage;
//!
//! let mut window = SlidingWindowAverage::<f32>::new(3).unwrap();
//! for v in [1.0, 2.0, 3.0, 4.0] {
//!     window.add(v);
//! }
//! assert_eq!(window.len(), 3);
//! assert_eq!(window.average(), 3.0); // (2 + 3 + 4) / 3
//! ```

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::error::{EngineError, Result};

/// Arithmetic needed to average a sample type.
///
/// Implemented for `f32` and `f64`; composite samples (several axes plus
/// elapsed time) implement it component-wise.
pub trait WindowSample: Copy {
    /// Additive identity.
    fn zero() -> Self;
    fn plus(self, other: Self) -> Self;
    fn minus(self, other: Self) -> Self;
    /// Divides every component by `count` (always > 0).
    fn div_count(self, count: usize) -> Self;
}

impl WindowSample for f32 {
    fn zero() -> Self {
        0.0
    }
    fn plus(self, other: Self) -> Self {
        self + other
    }
    fn minus(self, other: Self) -> Self {
        self - other
    }
    fn div_count(self, count: usize) -> Self {
        self / count as f32
    }
}

impl WindowSample for f64 {
    fn zero() -> Self {
        0.0
    }
    fn plus(self, other: Self) -> Self {
        self + other
    }
    fn minus(self, other: Self) -> Self {
        self - other
    }
    fn div_count(self, count: usize) -> Self {
        self / count as f64
    }
}

/// FIFO of samples with a running sum.
#[derive(Debug, Clone)]
pub struct SlidingWindowAverage<T: WindowSample> {
    capacity: usize,
    samples: VecDeque<T>,
    sum: T,
    average: T,
}

impl<T: WindowSample> SlidingWindowAverage<T> {
    /// Creates an empty window.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfRange`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        check_capacity(capacity)?;
        Ok(Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            sum: T::zero(),
            average: T::zero(),
        })
    }

    /// Creates an empty window with a capacity known to be valid.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: capacity.get(),
            samples: VecDeque::with_capacity(capacity.get()),
            sum: T::zero(),
            average: T::zero(),
        }
    }

    /// Appends a sample, evicting the oldest one first if the window is full.
    pub fn add(&mut self, value: T) {
        if self.samples.len() >= self.capacity {
            self.evict_oldest();
        }
        self.samples.push_back(value);
        self.sum = self.sum.plus(value);
        self.recompute();
    }

    /// Evicts oldest-first while `predicate(oldest, sum)` holds.
    ///
    /// `sum` is the running total before evicting `oldest`. Returns the
    /// number of evicted samples.
    pub fn remove_while<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T, &T) -> bool,
    {
        let mut removed = 0;
        while let Some(oldest) = self.samples.front() {
            if !predicate(oldest, &self.sum) {
                break;
            }
            self.evict_oldest();
            removed += 1;
        }
        if removed > 0 {
            self.recompute();
        }
        removed
    }

    /// Changes the capacity and evicts any surplus oldest samples.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfRange`] if `capacity` is zero.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        check_capacity(capacity)?;
        self.resize(NonZeroUsize::MIN.saturating_add(capacity - 1));
        Ok(())
    }

    /// [`set_capacity`](Self::set_capacity) for a capacity known to be valid.
    pub fn resize(&mut self, capacity: NonZeroUsize) {
        let capacity = capacity.get();
        self.capacity = capacity;
        if self.samples.len() > capacity {
            while self.samples.len() > capacity {
                self.evict_oldest();
            }
            self.recompute();
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Running sum of the buffered samples.
    #[must_use]
    pub fn sum(&self) -> T {
        self.sum
    }

    /// `sum / len`, or zero when empty.
    #[must_use]
    pub fn average(&self) -> T {
        self.average
    }

    /// Drops every sample. The capacity is kept.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = T::zero();
        self.average = T::zero();
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.samples.pop_front() {
            self.sum = self.sum.minus(oldest);
        }
        if self.samples.is_empty() {
            // no drift carried into the next run
            self.sum = T::zero();
        }
    }

    fn recompute(&mut self) {
        self.average = if self.samples.is_empty() {
            T::zero()
        } else {
            self.sum.div_count(self.samples.len())
        };
    }
}

fn check_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(EngineError::OutOfRange(
            "window capacity must be at least 1".to_string(),
        ));
    }
    Ok(())
}
