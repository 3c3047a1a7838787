//! # Trigger Pipeline
//!
//! One-axis analog trigger: raw value in `[0, 1]`, `0` released.
//!
//! Stages: smoothing, inversion (`1 - v`), dead zone, shaping. Derived
//! values (delta, speed, moving, pushed) are recomputed on every pass.

use std::time::Duration;
use tracing::warn;

use super::math::{clamp01, dead_zone, elapsed_from_secs, interpolate};
use super::shaping::{shape, Shaping};
use super::smoothing::{Smoother, TriggerSample};
use super::{check_unit_interval, AxisProperty};
use crate::error::{ensure_not_nan, Result};
use crate::notify::{DispatchMode, Notifier, PropertyListener};

/// Trigger tuning.
#[derive(Debug, Clone, Default)]
pub struct TriggerSettings {
    pub inner_dead_zone: f32,
    pub outer_dead_zone: f32,
    pub invert: bool,
    pub shaping: Option<Shaping>,
    pub smoothing_factor: f32,
    pub smoothing_period: Duration,
}

impl TriggerSettings {
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("inner_dead_zone", self.inner_dead_zone)?;
        check_unit_interval("outer_dead_zone", self.outer_dead_zone)?;
        check_unit_interval("smoothing_factor", self.smoothing_factor)?;
        Ok(())
    }

    fn smoothing_enabled(&self) -> bool {
        self.smoothing_factor > 0.0 && !self.smoothing_period.is_zero()
    }
}

/// One-axis analog trigger state.
#[derive(Debug)]
pub struct Trigger {
    notifier: Notifier<AxisProperty>,
    settings: TriggerSettings,
    smoother: Smoother<TriggerSample>,

    raw: f32,
    frame_time: Duration,
    pending_sample: bool,

    is_valid: bool,
    validating: bool,

    effective: f32,
    delta: f32,
    movement_speed: f32,
    is_moving: bool,
    is_pushed: bool,
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new(DispatchMode::default())
    }
}

impl Trigger {
    /// Creates a released trigger.
    #[must_use]
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            notifier: Notifier::new(mode),
            settings: TriggerSettings::default(),
            smoother: Smoother::new(Duration::ZERO),
            raw: 0.0,
            frame_time: Duration::ZERO,
            pending_sample: false,
            is_valid: true,
            validating: false,
            effective: 0.0,
            delta: 0.0,
            movement_speed: 0.0,
            is_moving: false,
            is_pushed: false,
        }
    }

    pub fn with_settings(mode: DispatchMode, settings: TriggerSettings) -> Result<Self> {
        settings.validate()?;
        let mut trigger = Self::new(mode);
        trigger.smoother.set_period(settings.smoothing_period);
        trigger.settings = settings;
        Ok(trigger)
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier<AxisProperty> {
        &self.notifier
    }

    pub fn subscribe(&self, listener: PropertyListener<AxisProperty>) -> bool {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, listener: &PropertyListener<AxisProperty>) -> bool {
        self.notifier.unsubscribe(listener)
    }

    /// Ingests one raw value, clamped to `[0, 1]`, and marks the trigger dirty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`](crate::error::EngineError::InvalidArgument)
    /// for NaN, before anything is modified.
    ///
    /// An unread previous sample is validated first, and a shaping failure
    /// from that is returned without ingesting `value`.
    pub fn update_raw(&mut self, value: f32, elapsed: Duration) -> Result<()> {
        let raw = clamp01(ensure_not_nan("trigger value", value)?);
        if self.pending_sample {
            self.validate()?;
        }
        self.frame_time = elapsed;
        self.notifier.set_property(&mut self.raw, raw, AxisProperty::Raw);
        self.pending_sample = true;
        self.is_valid = false;
        self.notifier.dispatch_all();
        Ok(())
    }

    pub fn update_raw_secs(&mut self, value: f32, secs: f64) -> Result<()> {
        ensure_not_nan("trigger value", value)?;
        let elapsed = elapsed_from_secs(secs)?;
        self.update_raw(value, elapsed)
    }

    pub fn invalidate(&mut self) {
        self.is_valid = false;
    }

    /// Recomputes the effective value if it is dirty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedOperation`](crate::error::EngineError::UnsupportedOperation)
    /// if the shaping curve yields NaN.
    pub fn validate(&mut self) -> Result<()> {
        if self.is_valid || self.validating {
            return Ok(());
        }
        self.validating = true;
        let result = self.recompute();
        self.validating = false;
        result?;

        self.is_valid = true;
        self.notifier.dispatch_all();
        Ok(())
    }

    fn recompute(&mut self) -> Result<()> {
        let mut value = self.raw;

        if self.settings.smoothing_enabled() {
            if self.pending_sample {
                self.pending_sample = false;
                self.smoother.push(TriggerSample {
                    value,
                    elapsed: self.frame_time.as_secs_f64(),
                });
            }
            if let Some(average) = self.smoother.average() {
                value = clamp01(interpolate(value, average.value, self.settings.smoothing_factor));
            }
        } else {
            self.pending_sample = false;
        }

        if self.settings.invert {
            value = 1.0 - value;
        }
        value = dead_zone(
            value,
            self.settings.inner_dead_zone,
            self.settings.outer_dead_zone,
        );
        value = shape(self.settings.shaping.as_ref(), "trigger", value)?;
        let effective = clamp01(value);

        let previous = self.effective;
        self.notifier
            .set_property(&mut self.effective, effective, AxisProperty::Effective);

        let delta = effective - previous;
        let moving = delta != 0.0;
        let secs = self.frame_time.as_secs_f32();
        let speed = if secs > 0.0 {
            delta.abs() / secs
        } else if moving {
            f32::INFINITY
        } else {
            0.0
        };

        self.notifier.set_property(&mut self.delta, delta, AxisProperty::Delta);
        self.notifier
            .set_property(&mut self.movement_speed, speed, AxisProperty::MovementSpeed);
        self.notifier
            .set_property(&mut self.is_moving, moving, AxisProperty::IsMoving);
        self.notifier
            .set_property(&mut self.is_pushed, effective > 0.0, AxisProperty::IsPushed);
        Ok(())
    }

    /// Returns to the released state without raising notifications.
    pub fn reset(&mut self) {
        self.smoother.clear();
        self.raw = 0.0;
        self.frame_time = Duration::ZERO;
        self.pending_sample = false;
        self.is_valid = true;
        self.effective = 0.0;
        self.delta = 0.0;
        self.movement_speed = 0.0;
        self.is_moving = false;
        self.is_pushed = false;
    }

    #[must_use]
    pub fn raw(&self) -> f32 {
        self.raw
    }

    #[must_use]
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn effective(&mut self) -> Result<f32> {
        self.validate()?;
        Ok(self.effective)
    }

    pub fn delta(&mut self) -> Result<f32> {
        self.validate()?;
        Ok(self.delta)
    }

    pub fn movement_speed(&mut self) -> Result<f32> {
        self.validate()?;
        Ok(self.movement_speed)
    }

    pub fn is_moving(&mut self) -> Result<bool> {
        self.validate()?;
        Ok(self.is_moving)
    }

    pub fn is_pushed(&mut self) -> Result<bool> {
        self.validate()?;
        Ok(self.is_pushed)
    }

    #[must_use]
    pub fn settings(&self) -> &TriggerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: TriggerSettings) -> Result<()> {
        if let Err(e) = settings.validate() {
            warn!("Rejected trigger settings: {}", e);
            return Err(e);
        }
        if !settings.smoothing_enabled() {
            self.smoother.clear();
        }
        self.smoother.set_period(settings.smoothing_period);
        self.settings = settings;
        self.settings_changed();
        Ok(())
    }

    pub fn set_inner_dead_zone(&mut self, value: f32) -> Result<()> {
        self.settings.inner_dead_zone = check_unit_interval("inner_dead_zone", value)?;
        self.settings_changed();
        Ok(())
    }

    pub fn set_outer_dead_zone(&mut self, value: f32) -> Result<()> {
        self.settings.outer_dead_zone = check_unit_interval("outer_dead_zone", value)?;
        self.settings_changed();
        Ok(())
    }

    pub fn set_invert(&mut self, invert: bool) {
        self.settings.invert = invert;
        self.settings_changed();
    }

    pub fn set_shaping(&mut self, shaping: Option<Shaping>) {
        self.settings.shaping = shaping;
        self.settings_changed();
    }

    pub fn set_smoothing_factor(&mut self, factor: f32) -> Result<()> {
        self.settings.smoothing_factor = check_unit_interval("smoothing_factor", factor)?;
        if !self.settings.smoothing_enabled() {
            self.smoother.clear();
        }
        self.settings_changed();
        Ok(())
    }

    pub fn set_smoothing_period(&mut self, period: Duration) {
        self.settings.smoothing_period = period;
        self.smoother.set_period(period);
        if !self.settings.smoothing_enabled() {
            self.smoother.clear();
        }
        self.settings_changed();
    }

    fn settings_changed(&mut self) {
        self.is_valid = false;
        self.notifier.notify(AxisProperty::Settings);
        self.notifier.dispatch_all();
    }
}
