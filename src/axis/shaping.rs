//! # Shaping Curves
//!
//! Response curves applied to one pipeline stage (a stick axis, a stick's
//! polar radius or angle, or a trigger value).
//!
//! ## Exponential Curves
//!
//! Expo curves make small movements less sensitive while keeping full
//! deflection at the endpoints:
//!
//! `output = (1 - expo) * input + expo * input³`
//!
//! - `expo = 0.0`: linear response
//! - `expo = 0.3`: mild curve
//! - `expo = 0.7`: strong curve
//!
//! ## Custom curves
//!
//! Any `Fn(f32) -> f32`. A custom curve returning NaN makes the validation
//! pass that ran it fail with [`EngineError::UnsupportedOperation`].
//!
//! ```
//! use gamepad_dynamics::axis::Shaping;
//!
//! let curve = Shaping::expo(0.3);
//! assert_eq!(curve.apply(0.0), 0.0);
//! assert!((curve.apply(1.0) - 1.0).abs() < 0.001);
//! assert!((curve.apply(-1.0) + 1.0).abs() < 0.001);
//!
//! let halve = Shaping::custom(|v| v * 0.5);
//! assert_eq!(halve.apply(0.8), 0.4);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::{EngineError, Result};

/// Response curve for one pipeline stage.
#[derive(Clone, Default)]
pub enum Shaping {
    /// Identity.
    #[default]
    Linear,
    /// Cubic expo, factor clamped to `[0, 1]`. Sign preserving.
    Expo(f32),
    /// Caller-supplied curve.
    Custom(Rc<dyn Fn(f32) -> f32>),
}

impl fmt::Debug for Shaping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shaping::Linear => write!(f, "Linear"),
            Shaping::Expo(expo) => write!(f, "Expo({})", expo),
            Shaping::Custom(curve) => write!(f, "Custom({:p})", Rc::as_ptr(curve)),
        }
    }
}

impl Shaping {
    /// Expo curve with `expo` clamped to `[0, 1]`.
    #[must_use]
    pub fn expo(expo: f32) -> Self {
        Shaping::Expo(expo.clamp(0.0, 1.0))
    }

    /// Wraps a closure as a custom curve.
    pub fn custom<F>(curve: F) -> Self
    where
        F: Fn(f32) -> f32 + 'static,
    {
        Shaping::Custom(Rc::new(curve))
    }

    /// Evaluates the curve.
    #[must_use]
    pub fn apply(&self, input: f32) -> f32 {
        match self {
            Shaping::Linear => input,
            Shaping::Expo(expo) => apply_expo(input, *expo),
            Shaping::Custom(curve) => curve(input),
        }
    }

    /// Evaluates the curve and rejects a NaN result.
    ///
    /// `stage` names the pipeline stage in the error message.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedOperation`] if the curve yields NaN.
    pub fn apply_checked(&self, stage: &str, input: f32) -> Result<f32> {
        let output = self.apply(input);
        if output.is_nan() {
            return Err(EngineError::UnsupportedOperation(format!(
                "{} shaping returned NaN for input {}",
                stage, input
            )));
        }
        Ok(output)
    }
}

/// Runs an optional curve, passing the value through when none is set.
pub(crate) fn shape(curve: Option<&Shaping>, stage: &str, input: f32) -> Result<f32> {
    match curve {
        Some(curve) => curve.apply_checked(stage, input),
        None => Ok(input),
    }
}

fn apply_expo(input: f32, expo: f32) -> f32 {
    if expo == 0.0 {
        return input;
    }
    let magnitude = input.abs();
    let curved = (1.0 - expo) * magnitude + expo * magnitude.powi(3);
    curved.copysign(input)
}
