//! # Analog Axis Module
//!
//! Turns raw stick and trigger readings into effective values.
//!
//! This module handles:
//! - Numeric helpers ([`math`])
//! - Running averages over a sample window ([`SlidingWindowAverage`])
//! - Time-windowed smoothing ([`smoothing`])
//! - Response curves ([`Shaping`])
//! - The two-axis stick pipeline ([`Joystick`]) and the one-axis trigger
//!   pipeline ([`Trigger`])
//!
//! Both pipelines ingest raw values eagerly and compute effective values
//! lazily: `update_raw` marks the axis dirty and the next validating read (or
//! an explicit `validate()`) runs the modifier stages. A sample that was
//! never read is validated when the next one arrives, so smoothing and the
//! derived values see every frame whatever the read cadence.

pub mod average;
pub mod joystick;
pub mod math;
pub mod shaping;
pub mod smoothing;
pub mod trigger;

pub use average::{SlidingWindowAverage, WindowSample};
pub use joystick::{Direction, Joystick, JoystickSettings, StickPosition};
pub use shaping::Shaping;
pub use trigger::{Trigger, TriggerSettings};

use crate::error::{EngineError, Result};

/// Observable properties of an analog axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisProperty {
    Raw,
    Effective,
    Delta,
    MovementSpeed,
    IsMoving,
    Direction,
    IsPushed,
    /// Any configuration value.
    Settings,
}

/// Checks a dead zone width or a smoothing factor.
pub(crate) fn check_unit_interval(name: &str, value: f32) -> Result<f32> {
    if value.is_nan() {
        return Err(EngineError::InvalidArgument(format!("{} must not be NaN", name)));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(EngineError::OutOfRange(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_interval_checks() {
        assert_eq!(check_unit_interval("inner", 0.2).unwrap(), 0.2);
        assert_eq!(check_unit_interval("inner", 1.0).unwrap(), 1.0);
        assert!(matches!(check_unit_interval("inner", 1.5), Err(EngineError::OutOfRange(_))));
        assert!(matches!(check_unit_interval("f", -0.1), Err(EngineError::OutOfRange(_))));
        assert!(matches!(
            check_unit_interval("f", f32::NAN),
            Err(EngineError::InvalidArgument(_))
        ));
    }
}
