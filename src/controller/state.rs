//! # Raw Samples
//!
//! One tick's worth of unprocessed controller input, as handed to
//! [`Gamepad::update`](super::Gamepad::update) by a raw-sample source.
//!
//! Sticks are normalized to `[-1, 1]` with `+Y` up, triggers to `[0, 1]`.
//!
//! ```
//! use gamepad_dynamics::controller::{Button, RawSample};
//!
//! let mut sample = RawSample::new();
//! assert!(!sample.any_button_pressed());
//!
//! sample.set_button(Button::L1, true);
//! assert!(sample.is_pressed(Button::L1));
//! ```

use crate::axis::StickPosition;
use crate::error::{ensure_not_nan, Result};

use super::buttons::{Button, ButtonMask};

/// Complete raw input state for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Pressed buttons.
    pub buttons: ButtonMask,
    pub left_stick: StickPosition,
    pub right_stick: StickPosition,
    /// 0 = released, 1 = fully pressed.
    pub left_trigger: f32,
    pub right_trigger: f32,
}

impl Default for RawSample {
    /// Sticks centred, triggers and buttons released.
    fn default() -> Self {
        Self {
            buttons: ButtonMask::empty(),
            left_stick: StickPosition::default(),
            right_stick: StickPosition::default(),
            left_trigger: 0.0,
            right_trigger: 0.0,
        }
    }
}

impl RawSample {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons.contains(button.mask())
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.buttons.set(button.mask(), pressed);
    }

    /// Checks if any stick component is further than `threshold` from centre.
    #[must_use]
    pub fn any_stick_moved(&self, threshold: f32) -> bool {
        [self.left_stick, self.right_stick]
            .iter()
            .any(|s| s.x.abs() > threshold || s.y.abs() > threshold)
    }

    #[must_use]
    pub fn any_button_pressed(&self) -> bool {
        !self.buttons.is_empty()
    }

    /// Checks if any trigger is pressed beyond `threshold`.
    #[must_use]
    pub fn any_trigger_pressed(&self, threshold: f32) -> bool {
        self.left_trigger > threshold || self.right_trigger > threshold
    }

    /// Rejects a sample containing NaN.
    pub fn check(&self) -> Result<()> {
        ensure_not_nan("left stick x", self.left_stick.x)?;
        ensure_not_nan("left stick y", self.left_stick.y)?;
        ensure_not_nan("right stick x", self.right_stick.x)?;
        ensure_not_nan("right stick y", self.right_stick.y)?;
        ensure_not_nan("left trigger", self.left_trigger)?;
        ensure_not_nan("right trigger", self.right_trigger)?;
        Ok(())
    }
}
