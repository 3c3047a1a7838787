//! # Joystick Pipeline
//!
//! Two-axis analog stick: raw `(x, y)` in `[-1, 1]` with `+Y` up.
//!
//! ## Stages
//!
//! 1. **Smoothing** (factor > 0 and period > 0): the raw sample joins a
//!    time window and the raw value is blended toward the window average.
//! 2. **Cartesian modifiers**: per-axis inversion, then per-axis shaping.
//! 3. **Polar modifiers**: radial dead zone (inner and outer), then radius and
//!    angle shaping. A zero radius forces the angle to zero.
//! 4. **Derived values**: delta, movement speed, direction and push state,
//!    recomputed on every pass.
//!
//! Raw polar values (`raw_angle`, `raw_radius`) are derived on ingestion; the
//! effective value is only computed on demand.
//!
//! ```
//! use std::time::Duration;
//! use gamepad_dynamics::axis::{Direction, Joystick};
//! use gamepad_dynamics::notify::DispatchMode;
//!
//! let mut stick = Joystick::new(DispatchMode::Deferred);
//! stick.set_inner_dead_zone(0.1).unwrap();
//!
//! stick.update_raw(0.05, 0.0, Duration::from_millis(16)).unwrap();
//! assert_eq!(stick.direction().unwrap(), Direction::None);
//!
//! stick.update_raw(0.0, -0.9, Duration::from_millis(16)).unwrap();
//! assert_eq!(stick.direction().unwrap(), Direction::Down);
//! ```

use std::time::Duration;
use tracing::warn;

use super::math::{
    cartesian_to_polar, clamp_unit, dead_zone, elapsed_from_secs, interpolate,
    normalized_to_radians, polar_to_cartesian, radians_to_normalized, wrap_normalized,
};
use super::shaping::{shape, Shaping};
use super::smoothing::{Smoother, StickSample};
use super::{check_unit_interval, AxisProperty};
use crate::error::{ensure_not_nan, Result};
use crate::notify::{DispatchMode, Notifier, PropertyListener};

/// A stick position, each axis in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StickPosition {
    pub x: f32,
    pub y: f32,
}

impl StickPosition {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Compass sector of a pushed stick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Stick at rest.
    #[default]
    None,
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Buckets a clockwise-from-up normalized angle into four sectors.
    ///
    /// `Up` spans `[0.875, 1) ∪ [0, 0.125)`, then `Right`, `Down` and `Left`
    /// follow in quarter turns. A zero radius is always `None`.
    #[must_use]
    pub fn from_polar(angle: f32, radius: f32) -> Self {
        if radius <= 0.0 {
            return Direction::None;
        }
        let angle = angle.rem_euclid(1.0);
        if !(0.125..0.875).contains(&angle) {
            Direction::Up
        } else if angle < 0.375 {
            Direction::Right
        } else if angle < 0.625 {
            Direction::Down
        } else {
            Direction::Left
        }
    }
}

/// Joystick tuning.
#[derive(Debug, Clone, Default)]
pub struct JoystickSettings {
    /// Radial inner dead zone, `[0, 1]`.
    pub inner_dead_zone: f32,
    /// Radial outer dead zone, `[0, 1]`.
    pub outer_dead_zone: f32,
    pub invert_x: bool,
    pub invert_y: bool,
    pub x_shaping: Option<Shaping>,
    pub y_shaping: Option<Shaping>,
    pub radius_shaping: Option<Shaping>,
    pub angle_shaping: Option<Shaping>,
    /// Blend toward the window average, `[0, 1]`. Zero disables smoothing.
    pub smoothing_factor: f32,
    /// Time covered by the smoothing window. Zero disables smoothing.
    pub smoothing_period: Duration,
}

impl JoystickSettings {
    /// Checks dead zones and smoothing factor ranges.
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

/// Two-axis analog stick state.
#[derive(Debug)]
pub struct Joystick {
    notifier: Notifier<AxisProperty>,
    settings: JoystickSettings,
    smoother: Smoother<StickSample>,

    raw: StickPosition,
    raw_angle: f32,
    raw_radius: f32,
    raw_within_unit_circle: bool,
    frame_time: Duration,
    pending_sample: bool,

    is_valid: bool,
    validating: bool,

    effective: StickPosition,
    angle: f32,
    radius: f32,
    delta: StickPosition,
    movement_speed: f32,
    is_moving: bool,
    direction: Direction,
    is_pushed: bool,
}

impl Default for Joystick {
    fn default() -> Self {
        Self::new(DispatchMode::default())
    }
}

impl Joystick {
    /// Creates a centred stick with default settings.
    #[must_use]
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            notifier: Notifier::new(mode),
            settings: JoystickSettings::default(),
            smoother: Smoother::new(Duration::ZERO),
            raw: StickPosition::default(),
            raw_angle: 0.0,
            raw_radius: 0.0,
            raw_within_unit_circle: true,
            frame_time: Duration::ZERO,
            pending_sample: false,
            is_valid: true,
            validating: false,
            effective: StickPosition::default(),
            angle: 0.0,
            radius: 0.0,
            delta: StickPosition::default(),
            movement_speed: 0.0,
            is_moving: false,
            direction: Direction::None,
            is_pushed: false,
        }
    }

    /// Creates a centred stick with the given settings.
    ///
    /// # Errors
    ///
    /// Fails if `settings` does not pass [`JoystickSettings::validate`].
    pub fn with_settings(mode: DispatchMode, settings: JoystickSettings) -> Result<Self> {
        settings.validate()?;
        let mut stick = Self::new(mode);
        stick.smoother.set_period(settings.smoothing_period);
        stick.settings = settings;
        Ok(stick)
    }

    // ---- notification ----

    #[must_use]
    pub fn notifier(&self) -> &Notifier<AxisProperty> {
        &self.notifier
    }

    /// Registers a property-change listener.
    pub fn subscribe(&self, listener: PropertyListener<AxisProperty>) -> bool {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, listener: &PropertyListener<AxisProperty>) -> bool {
        self.notifier.unsubscribe(listener)
    }

    // ---- ingestion ----

    /// Ingests one raw sample.
    ///
    /// Components are clamped to `[-1, 1]`; raw polar values are derived
    /// immediately and the effective value is marked dirty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`](crate::error::EngineError::InvalidArgument)
    /// for a NaN component. Nothing is modified in that case.
    ///
    /// A previous sample that was never read is validated first, so delta
    /// and speed always describe one frame. A shaping failure while doing
    /// so is returned and the new sample is not ingested.
    pub fn update_raw(&mut self, x: f32, y: f32, elapsed: Duration) -> Result<()> {
        let x = ensure_not_nan("stick x", x)?;
        let y = ensure_not_nan("stick y", y)?;
        if self.pending_sample {
            self.validate()?;
        }
        let raw = StickPosition::new(clamp_unit(x), clamp_unit(y));

        self.frame_time = elapsed;
        self.notifier.set_property(&mut self.raw, raw, AxisProperty::Raw);

        let (radians, radius) = cartesian_to_polar(raw.x, raw.y);
        self.raw_angle = radians_to_normalized(radians);
        self.raw_radius = radius;
        self.raw_within_unit_circle = radius <= 1.0;

        self.pending_sample = true;
        self.is_valid = false;
        self.notifier.dispatch_all();
        Ok(())
    }

    /// [`Joystick::update_raw`] with the frame time in float seconds.
    pub fn update_raw_secs(&mut self, x: f32, y: f32, secs: f64) -> Result<()> {
        ensure_not_nan("stick x", x)?;
        ensure_not_nan("stick y", y)?;
        let elapsed = elapsed_from_secs(secs)?;
        self.update_raw(x, y, elapsed)
    }

    /// Marks the effective value dirty.
    pub fn invalidate(&mut self) {
        self.is_valid = false;
    }

    /// Recomputes the effective value if it is dirty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedOperation`](crate::error::EngineError::UnsupportedOperation)
    /// if a shaping curve yields NaN. The raw sample stays ingested and the
    /// axis stays dirty.
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
        let mut x = self.raw.x;
        let mut y = self.raw.y;

        if self.settings.smoothing_enabled() {
            if self.pending_sample {
                self.pending_sample = false;
                self.smoother.push(StickSample {
                    x,
                    y,
                    elapsed: self.frame_time.as_secs_f64(),
                });
            }
            if let Some(average) = self.smoother.average() {
                let factor = self.settings.smoothing_factor;
                x = clamp_unit(interpolate(x, average.x, factor));
                y = clamp_unit(interpolate(y, average.y, factor));
            }
        } else {
            self.pending_sample = false;
        }

        if self.settings.invert_x {
            x = -x;
        }
        if self.settings.invert_y {
            y = -y;
        }
        x = shape(self.settings.x_shaping.as_ref(), "stick x", x)?;
        y = shape(self.settings.y_shaping.as_ref(), "stick y", y)?;

        let (radians, radius) = cartesian_to_polar(x, y);
        let mut angle = radians_to_normalized(radians);
        let mut radius = dead_zone(
            radius,
            self.settings.inner_dead_zone,
            self.settings.outer_dead_zone,
        );
        radius = shape(self.settings.radius_shaping.as_ref(), "stick radius", radius)?;
        angle = wrap_normalized(shape(
            self.settings.angle_shaping.as_ref(),
            "stick angle",
            angle,
        )?);
        if radius == 0.0 {
            angle = 0.0;
        }

        let (ex, ey) = polar_to_cartesian(normalized_to_radians(angle), radius);
        let effective = StickPosition::new(clamp_unit(ex), clamp_unit(ey));

        let previous = self.effective;
        self.notifier
            .set_property(&mut self.effective, effective, AxisProperty::Effective);
        self.angle = angle;
        self.radius = radius;

        // derived values follow every pass, moved or not
        let delta = StickPosition::new(effective.x - previous.x, effective.y - previous.y);
        let moving = !delta.is_zero();
        let secs = self.frame_time.as_secs_f32();
        let speed = if secs > 0.0 {
            delta.length() / secs
        } else if moving {
            f32::INFINITY
        } else {
            0.0
        };
        let direction = Direction::from_polar(angle, radius);

        self.notifier.set_property(&mut self.delta, delta, AxisProperty::Delta);
        self.notifier
            .set_property(&mut self.movement_speed, speed, AxisProperty::MovementSpeed);
        self.notifier
            .set_property(&mut self.is_moving, moving, AxisProperty::IsMoving);
        self.notifier
            .set_property(&mut self.direction, direction, AxisProperty::Direction);
        self.notifier
            .set_property(&mut self.is_pushed, radius > 0.0, AxisProperty::IsPushed);
        Ok(())
    }

    /// Returns to the centred state without raising notifications.
    ///
    /// Settings are kept; the smoothing window is emptied.
    pub fn reset(&mut self) {
        self.smoother.clear();
        self.raw = StickPosition::default();
        self.raw_angle = 0.0;
        self.raw_radius = 0.0;
        self.raw_within_unit_circle = true;
        self.frame_time = Duration::ZERO;
        self.pending_sample = false;
        self.is_valid = true;
        self.effective = StickPosition::default();
        self.angle = 0.0;
        self.radius = 0.0;
        self.delta = StickPosition::default();
        self.movement_speed = 0.0;
        self.is_moving = false;
        self.direction = Direction::None;
        self.is_pushed = false;
    }

    // ---- non-validating reads ----

    #[must_use]
    pub fn raw(&self) -> StickPosition {
        self.raw
    }

    /// Raw angle on the clockwise-from-up `[0, 1)` scale.
    #[must_use]
    pub fn raw_angle(&self) -> f32 {
        self.raw_angle
    }

    #[must_use]
    pub fn raw_radius(&self) -> f32 {
        self.raw_radius
    }

    #[must_use]
    pub fn is_raw_within_unit_circle(&self) -> bool {
        self.raw_within_unit_circle
    }

    /// Elapsed time passed with the last raw sample.
    #[must_use]
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    // ---- validating reads ----

    pub fn effective(&mut self) -> Result<StickPosition> {
        self.validate()?;
        Ok(self.effective)
    }

    /// Effective angle on the clockwise-from-up scale.
    pub fn angle(&mut self) -> Result<f32> {
        self.validate()?;
        Ok(self.angle)
    }

    /// Effective radius after the dead zone and radius shaping.
    pub fn radius(&mut self) -> Result<f32> {
        self.validate()?;
        Ok(self.radius)
    }

    pub fn delta(&mut self) -> Result<StickPosition> {
        self.validate()?;
        Ok(self.delta)
    }

    /// Effective displacement per second over the last frame.
    pub fn movement_speed(&mut self) -> Result<f32> {
        self.validate()?;
        Ok(self.movement_speed)
    }

    pub fn is_moving(&mut self) -> Result<bool> {
        self.validate()?;
        Ok(self.is_moving)
    }

    pub fn direction(&mut self) -> Result<Direction> {
        self.validate()?;
        Ok(self.direction)
    }

    pub fn is_pushed(&mut self) -> Result<bool> {
        self.validate()?;
        Ok(self.is_pushed)
    }

    // ---- settings ----

    #[must_use]
    pub fn settings(&self) -> &JoystickSettings {
        &self.settings
    }

    /// Replaces every setting at once.
    pub fn set_settings(&mut self, settings: JoystickSettings) -> Result<()> {
        if let Err(e) = settings.validate() {
            warn!("Rejected joystick settings: {}", e);
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

    pub fn set_invert_x(&mut self, invert: bool) {
        self.settings.invert_x = invert;
        self.settings_changed();
    }

    pub fn set_invert_y(&mut self, invert: bool) {
        self.settings.invert_y = invert;
        self.settings_changed();
    }

    pub fn set_x_shaping(&mut self, shaping: Option<Shaping>) {
        self.settings.x_shaping = shaping;
        self.settings_changed();
    }

    pub fn set_y_shaping(&mut self, shaping: Option<Shaping>) {
        self.settings.y_shaping = shaping;
        self.settings_changed();
    }

    pub fn set_radius_shaping(&mut self, shaping: Option<Shaping>) {
        self.settings.radius_shaping = shaping;
        self.settings_changed();
    }

    pub fn set_angle_shaping(&mut self, shaping: Option<Shaping>) {
        self.settings.angle_shaping = shaping;
        self.settings_changed();
    }

    /// Sets the smoothing blend factor. Zero disables smoothing.
    pub fn set_smoothing_factor(&mut self, factor: f32) -> Result<()> {
        self.settings.smoothing_factor = check_unit_interval("smoothing_factor", factor)?;
        if !self.settings.smoothing_enabled() {
            self.smoother.clear();
        }
        self.settings_changed();
        Ok(())
    }

    /// Sets the smoothing window period. Zero disables smoothing.
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
