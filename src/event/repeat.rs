//! # Accelerating Repeat
//!
//! Auto-repeat for a held digital button.
//!
//! ## Timeline
//!
//! 1. The press edge fires immediately.
//! 2. After `initial_delay` of continuous press the repeat cycle starts. The
//!    cycle start fires too, unless `initial_delay` is zero (the press already
//!    fired on that tick).
//! 3. While repeating, each elapsed `current_repeat_delay` fires once and the
//!    delay is divided by the acceleration ratio captured at cycle start,
//!    then clamped to `min_repeat_delay` (ratio > 1) or `max_repeat_delay`
//!    (ratio < 1). Overshoot carries into the next interval.
//! 4. Release resets everything.
//!
//! With `initial_delay = 100ms`, `repeat_delay = 50ms`, ratio `2` and
//! `min_repeat_delay = 10ms`, a held button fires at 0, 100, 150, 175, 187.5,
//! 197.5, 207.5 ms and so on.

use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::{raise, DigitalButtonState, DynamicEvent, EventArgs, EventListeners};
use crate::error::{EngineError, Result};

/// Timing parameters of a [`RepeatEvent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatSettings {
    /// Press time before the repeat cycle starts.
    pub initial_delay: Duration,
    /// First interval of the repeat cycle.
    pub repeat_delay: Duration,
    /// Divisor applied to the interval after every repeat. Must be > 0.
    pub acceleration_ratio: f64,
    /// Lower bound while accelerating.
    pub min_repeat_delay: Duration,
    /// Upper bound while decelerating.
    pub max_repeat_delay: Duration,
}

impl Default for RepeatSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(400),
            repeat_delay: Duration::from_millis(100),
            acceleration_ratio: 1.0,
            min_repeat_delay: Duration::from_millis(20),
            max_repeat_delay: Duration::from_secs(1),
        }
    }
}

impl RepeatSettings {
    /// Checks the parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] for a NaN ratio and
    /// [`EngineError::OutOfRange`] for a non-positive or infinite ratio, or a
    /// minimum delay above the maximum.
    pub fn validate(&self) -> Result<()> {
        validate_ratio(self.acceleration_ratio)?;
        if self.min_repeat_delay > self.max_repeat_delay {
            return Err(EngineError::OutOfRange(format!(
                "min_repeat_delay {:?} exceeds max_repeat_delay {:?}",
                self.min_repeat_delay, self.max_repeat_delay
            )));
        }
        Ok(())
    }
}

fn validate_ratio(ratio: f64) -> Result<()> {
    if ratio.is_nan() {
        return Err(EngineError::InvalidArgument(
            "acceleration_ratio must not be NaN".to_string(),
        ));
    }
    if ratio <= 0.0 || ratio.is_infinite() {
        return Err(EngineError::OutOfRange(format!(
            "acceleration_ratio must be a finite value > 0, got {}",
            ratio
        )));
    }
    Ok(())
}

/// Repeat progress passed to listeners.
#[derive(Debug, Clone)]
pub struct RepeatArgs {
    /// The repeating button.
    pub button: DigitalButtonState,
    /// Whether the repeat cycle has started.
    pub is_repeating: bool,
    /// Repeats fired in this cycle (the press itself does not count).
    pub repeat_count: u32,
    /// Interval until the next repeat.
    pub current_repeat_delay: Duration,
}

/// Fires on press and then repeatedly, with acceleration, while held.
pub struct RepeatEvent {
    name: String,
    listeners: EventListeners,
    button: DigitalButtonState,
    settings: RepeatSettings,
    was_pressed: bool,
    is_repeating: bool,
    repeat_count: u32,
    captured_ratio: f64,
    current_repeat_delay: Duration,
    accumulated: Duration,
}

impl fmt::Debug for RepeatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatEvent")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("is_repeating", &self.is_repeating)
            .field("repeat_count", &self.repeat_count)
            .field("current_repeat_delay", &self.current_repeat_delay)
            .field("accumulated", &self.accumulated)
            .finish()
    }
}

impl RepeatEvent {
    /// Creates a repeat event.
    ///
    /// # Errors
    ///
    /// Fails if `settings` does not pass [`RepeatSettings::validate`].
    pub fn new(
        name: impl Into<String>,
        button: DigitalButtonState,
        settings: RepeatSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            name: name.into(),
            listeners: EventListeners::new(),
            button,
            captured_ratio: settings.acceleration_ratio,
            settings,
            was_pressed: false,
            is_repeating: false,
            repeat_count: 0,
            current_repeat_delay: Duration::ZERO,
            accumulated: Duration::ZERO,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &RepeatSettings {
        &self.settings
    }

    /// Replaces all timing parameters.
    ///
    /// A ratio change does not affect a cycle already in progress.
    pub fn set_settings(&mut self, settings: RepeatSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn set_initial_delay(&mut self, delay: Duration) {
        self.settings.initial_delay = delay;
    }

    pub fn set_repeat_delay(&mut self, delay: Duration) {
        self.settings.repeat_delay = delay;
    }

    /// Sets the acceleration ratio. Rejects NaN, zero, negative and infinite values.
    pub fn set_acceleration_ratio(&mut self, ratio: f64) -> Result<()> {
        validate_ratio(ratio)?;
        self.settings.acceleration_ratio = ratio;
        Ok(())
    }

    /// Sets the lower interval bound. Must not exceed the upper bound.
    pub fn set_min_repeat_delay(&mut self, delay: Duration) -> Result<()> {
        RepeatSettings {
            min_repeat_delay: delay,
            ..self.settings
        }
        .validate()?;
        self.settings.min_repeat_delay = delay;
        Ok(())
    }

    /// Sets the upper interval bound. Must not be below the lower bound.
    pub fn set_max_repeat_delay(&mut self, delay: Duration) -> Result<()> {
        RepeatSettings {
            max_repeat_delay: delay,
            ..self.settings
        }
        .validate()?;
        self.settings.max_repeat_delay = delay;
        Ok(())
    }

    #[must_use]
    pub fn is_repeating(&self) -> bool {
        self.is_repeating
    }

    #[must_use]
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    #[must_use]
    pub fn current_repeat_delay(&self) -> Duration {
        self.current_repeat_delay
    }

    fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.is_repeating = false;
        self.repeat_count = 0;
        self.current_repeat_delay = Duration::ZERO;
    }

    fn fire(&self) {
        let args = EventArgs::Repeat(RepeatArgs {
            button: self.button.clone(),
            is_repeating: self.is_repeating,
            repeat_count: self.repeat_count,
            current_repeat_delay: self.current_repeat_delay,
        });
        raise(&self.name, &self.listeners, &args);
    }

    /// Divide, then clamp towards the bound in the direction of travel.
    fn rescale(&self, delay: Duration) -> Duration {
        let ratio = self.captured_ratio;
        if ratio == 1.0 {
            return delay;
        }
        let scaled =
            Duration::try_from_secs_f64(delay.as_secs_f64() / ratio).unwrap_or(Duration::MAX);

        if ratio > 1.0 {
            scaled.max(self.settings.min_repeat_delay)
        } else {
            scaled.min(self.settings.max_repeat_delay)
        }
    }
}

impl DynamicEvent for RepeatEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut EventListeners {
        &mut self.listeners
    }

    fn update(&mut self, elapsed: Duration) {
        if !self.button.is_pressed() {
            if self.was_pressed {
                self.was_pressed = false;
                self.reset();
            }
            return;
        }

        if !self.was_pressed {
            self.was_pressed = true;
            self.reset();
            self.fire();
        } else {
            self.accumulated = self.accumulated.saturating_add(elapsed);
        }

        if !self.is_repeating {
            if self.accumulated < self.settings.initial_delay {
                return;
            }
            self.is_repeating = true;
            self.captured_ratio = self.settings.acceleration_ratio;
            self.current_repeat_delay = self.settings.repeat_delay;
            self.accumulated -= self.settings.initial_delay;
            debug!(
                "{} repeat cycle started (ratio {})",
                self.name, self.captured_ratio
            );

            if !self.settings.initial_delay.is_zero() {
                self.repeat_count = self.repeat_count.saturating_add(1);
                self.fire();
            }
        }

        while self.accumulated >= self.current_repeat_delay {
            self.accumulated -= self.current_repeat_delay;
            self.repeat_count = self.repeat_count.saturating_add(1);
            self.current_repeat_delay = self.rescale(self.current_repeat_delay);
            self.fire();

            if self.current_repeat_delay.is_zero() {
                // One repeat per tick when the interval collapsed to zero.
                self.accumulated = Duration::ZERO;
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::testing::recorder;
    use crate::event::ButtonDriver;

    fn settings(initial: u64, repeat: u64, ratio: f64, min: u64, max: u64) -> RepeatSettings {
        RepeatSettings {
            initial_delay: Duration::from_millis(initial),
            repeat_delay: Duration::from_millis(repeat),
            acceleration_ratio: ratio,
            min_repeat_delay: Duration::from_millis(min),
            max_repeat_delay: Duration::from_millis(max),
        }
    }

    /// Holds the button for `total` in steps of `tick` and returns the
    /// elapsed press time (in ms) at every fire.
    fn hold(event: &mut RepeatEvent, driver: &ButtonDriver, tick: Duration, total: Duration) -> Vec<f64> {
        let (log, listener) = recorder();
        event.add_listener(listener.clone());

        let mut times = Vec::new();
        let mut elapsed = Duration::ZERO;
        let mut first = true;
        while elapsed <= total {
            let step = if first { Duration::ZERO } else { tick };
            first = false;
            driver.update(true, step);
            event.update(step);
            elapsed += step;
            let fired = log.borrow().len();
            while times.len() < fired {
                times.push(elapsed.as_secs_f64() * 1000.0);
            }
        }

        event.remove_listener(&listener);
        times
    }

    fn assert_times(actual: &[f64], expected: &[f64]) {
        assert!(
            actual.len() >= expected.len(),
            "expected at least {} fires, got {:?}",
            expected.len(),
            actual
        );
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 0.01, "fired at {:?}, expected {:?}", actual, expected);
        }
    }

    // ==================== Timeline Tests ====================

    #[test]
    fn test_accelerating_timeline() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("dpad", button, settings(100, 50, 2.0, 10, 1000)).unwrap();

        let times = hold(&mut event, &driver, Duration::from_micros(500), Duration::from_millis(300));

        assert_times(&times, &[0.0, 100.0, 150.0, 175.0, 187.5, 197.5, 207.5, 217.5]);
        assert_eq!(event.current_repeat_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_constant_rate_with_unit_ratio() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(50, 20, 1.0, 5, 500)).unwrap();

        let times = hold(&mut event, &driver, Duration::from_millis(1), Duration::from_millis(130));

        assert_times(&times, &[0.0, 50.0, 70.0, 90.0, 110.0, 130.0]);
        assert_eq!(times.len(), 6);
    }

    #[test]
    fn test_decelerating_clamps_to_max() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(10, 20, 0.5, 5, 60)).unwrap();

        let times = hold(&mut event, &driver, Duration::from_millis(1), Duration::from_millis(200));

        // Intervals: 20, 40, then clamped to 60.
        assert_times(&times, &[0.0, 10.0, 30.0, 70.0, 130.0, 190.0]);
    }

    #[test]
    fn test_zero_initial_delay_does_not_double_fire() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(0, 30, 1.0, 5, 500)).unwrap();

        let times = hold(&mut event, &driver, Duration::from_millis(1), Duration::from_millis(61));

        assert_times(&times, &[0.0, 30.0, 60.0]);
        assert_eq!(times.len(), 3);
        assert!(event.is_repeating());
        assert_eq!(event.repeat_count(), 2);
    }

    #[test]
    fn test_overshoot_carries_forward() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(0, 30, 1.0, 5, 500)).unwrap();
        let (log, listener) = recorder();
        event.add_listener(listener);

        driver.update(true, Duration::ZERO);
        event.update(Duration::ZERO);
        for _ in 0..4 {
            driver.update(true, Duration::from_millis(20));
            event.update(Duration::from_millis(20));
        }

        // 80ms held: press + repeats at 30 and 60 (remainders carried).
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_large_tick_fires_multiple_repeats() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(0, 10, 1.0, 5, 500)).unwrap();
        let (log, listener) = recorder();
        event.add_listener(listener);

        driver.update(true, Duration::ZERO);
        event.update(Duration::ZERO);
        driver.update(true, Duration::from_millis(35));
        event.update(Duration::from_millis(35));

        assert_eq!(log.borrow().len(), 4);
    }

    // ==================== Release / Reconfigure Tests ====================

    #[test]
    fn test_release_resets_cycle() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(20, 10, 2.0, 5, 500)).unwrap();
        hold(&mut event, &driver, Duration::from_millis(1), Duration::from_millis(50));
        assert!(event.is_repeating());

        driver.update(false, Duration::from_millis(1));
        event.update(Duration::from_millis(1));

        assert!(!event.is_repeating());
        assert_eq!(event.repeat_count(), 0);
        assert_eq!(event.current_repeat_delay(), Duration::ZERO);
    }

    #[test]
    fn test_ratio_change_mid_cycle_keeps_cadence() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(0, 40, 2.0, 5, 500)).unwrap();
        let (log, listener) = recorder();
        event.add_listener(listener);

        driver.update(true, Duration::ZERO);
        event.update(Duration::ZERO);
        event.set_acceleration_ratio(4.0).unwrap();
        for _ in 0..60 {
            driver.update(true, Duration::from_millis(1));
            event.update(Duration::from_millis(1));
        }

        // Captured ratio 2: 40 then 20 -> repeats at 40 and 60.
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(event.current_repeat_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_repeat_args_report_progress() {
        let (button, driver) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(10, 10, 1.0, 5, 500)).unwrap();
        let (log, listener) = recorder();
        event.add_listener(listener);

        driver.update(true, Duration::ZERO);
        event.update(Duration::ZERO);
        driver.update(true, Duration::from_millis(10));
        event.update(Duration::from_millis(10));

        let log = log.borrow();
        let press = log[0].args.as_repeat().expect("repeat args");
        assert!(!press.is_repeating);
        assert_eq!(press.repeat_count, 0);
        let cycle_start = log[1].args.as_repeat().expect("repeat args");
        assert!(cycle_start.is_repeating);
        assert_eq!(cycle_start.repeat_count, 1);
        assert!(cycle_start.button.is_pressed());
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_rejects_bad_ratio() {
        let (button, _) = DigitalButtonState::driven();
        assert!(matches!(
            RepeatEvent::new("r", button.clone(), settings(10, 10, 0.0, 5, 500)),
            Err(EngineError::OutOfRange(_))
        ));

        let mut event = RepeatEvent::new("r", button, RepeatSettings::default()).unwrap();
        assert!(matches!(
            event.set_acceleration_ratio(-1.0),
            Err(EngineError::OutOfRange(_))
        ));
        assert!(matches!(
            event.set_acceleration_ratio(f64::NAN),
            Err(EngineError::InvalidArgument(_))
        ));
        assert_eq!(event.settings().acceleration_ratio, 1.0);
    }

    #[test]
    fn test_rejects_min_above_max() {
        let (button, _) = DigitalButtonState::driven();
        let mut event = RepeatEvent::new("r", button, settings(10, 10, 1.0, 5, 50)).unwrap();

        assert!(event.set_min_repeat_delay(Duration::from_millis(60)).is_err());
        assert!(event.set_max_repeat_delay(Duration::from_millis(1)).is_err());
        assert!(event.set_max_repeat_delay(Duration::from_millis(80)).is_ok());
        assert!(event.set_min_repeat_delay(Duration::from_millis(60)).is_ok());
        assert_eq!(event.settings().min_repeat_delay, Duration::from_millis(60));
    }
}
