//! # Axis Math
//!
//! Pure numeric helpers used by the analog pipeline.
//!
//! ## Angle convention
//!
//! Normalized angles run clockwise from "up": `0.0` is up, `0.25` right,
//! `0.5` down and `0.75` left. Radians use the usual counter-clockwise
//! convention with `0` pointing right and `+Y` up.
//!
//! ```
//! use gamepad_dynamics::axis::math::{dead_zone, radians_to_normalized};
//! use std::f32::consts::FRAC_PI_2;
//!
//! assert_eq!(dead_zone(0.05, 0.1, 0.0), 0.0);
//! assert!((radians_to_normalized(FRAC_PI_2) - 0.0).abs() < 1e-6);
//! ```

use std::f32::consts::TAU;
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Clamps to `[-1, 1]`.
#[inline]
#[must_use]
pub fn clamp_unit(value: f32) -> f32 {
    value.clamp(-1.0, 1.0)
}

/// Clamps to `[0, 1]`.
#[inline]
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Linear interpolation: `from` at `t = 0`, `to` at `t = 1`.
#[inline]
#[must_use]
pub fn interpolate(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Applies an inner and outer dead zone to a magnitude in `[0, 1]`.
///
/// Values at or below `inner` map to `0`, values at or above `1 - outer` map
/// to `1`, and the band in between is rescaled linearly. If the two zones
/// cover the whole range the result is always `0`.
///
/// # Examples
///
/// ```
/// use gamepad_dynamics::axis::math::dead_zone;
///
/// assert_eq!(dead_zone(0.6, 0.0, 0.0), 0.6);
/// assert_eq!(dead_zone(0.95, 0.1, 0.1), 1.0);
/// assert_eq!(dead_zone(0.9, 0.5, 0.5), 0.0);
/// ```
#[must_use]
pub fn dead_zone(value: f32, inner: f32, outer: f32) -> f32 {
    if inner + outer >= 1.0 {
        return 0.0;
    }
    clamp01((value - inner) / (1.0 - inner - outer))
}

/// [`dead_zone`] for a signed value in `[-1, 1]`. The sign is preserved.
#[must_use]
pub fn dead_zone_signed(value: f32, inner: f32, outer: f32) -> f32 {
    let magnitude = dead_zone(value.abs(), inner, outer);
    if value < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Converts `(x, y)` to `(angle in radians, radius)`.
#[must_use]
pub fn cartesian_to_polar(x: f32, y: f32) -> (f32, f32) {
    (y.atan2(x), x.hypot(y))
}

/// Converts `(angle in radians, radius)` to `(x, y)`.
#[must_use]
pub fn polar_to_cartesian(angle: f32, radius: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (radius * cos, radius * sin)
}

/// Converts radians to the clockwise-from-up normalized scale `[0, 1)`.
#[must_use]
pub fn radians_to_normalized(angle: f32) -> f32 {
    wrap_normalized(0.25 - angle / TAU)
}

/// Wraps any normalized angle into `[0, 1)`.
#[must_use]
pub fn wrap_normalized(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Converts a clockwise-from-up normalized angle back to radians.
#[must_use]
pub fn normalized_to_radians(normalized: f32) -> f32 {
    (0.25 - normalized) * TAU
}

/// Converts float seconds to a [`Duration`].
///
/// Negative values clamp to zero. Values too large for a `Duration`
/// saturate.
///
/// # Errors
///
/// Returns [`EngineError::InvalidArgument`] for NaN.
pub fn elapsed_from_secs(secs: f64) -> Result<Duration> {
    if secs.is_nan() {
        return Err(EngineError::InvalidArgument(
            "elapsed time must not be NaN".to_string(),
        ));
    }
    if secs <= 0.0 {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPSILON: f32 = 1e-5;

    // ==================== Dead Zone Tests ====================

    #[test]
    fn test_dead_zone_identity_without_zones() {
        for i in 0..=100 {
            let v = i as f32 / 100.0;
            assert!((dead_zone(v, 0.0, 0.0) - v).abs() < EPSILON, "v = {}", v);
        }
    }

    #[test]
    fn test_dead_zone_collapses_when_zones_overlap() {
        for (inner, outer) in [(0.5, 0.5), (0.7, 0.4), (1.0, 0.0), (0.0, 1.0)] {
            for i in 0..=10 {
                let v = i as f32 / 10.0;
                assert_eq!(dead_zone(v, inner, outer), 0.0);
            }
        }
    }

    #[test]
    fn test_dead_zone_rescales_band() {
        // (0.55 - 0.1) / (1 - 0.1 - 0.1) = 0.5625
        assert!((dead_zone(0.55, 0.1, 0.1) - 0.5625).abs() < EPSILON);
        assert_eq!(dead_zone(0.1, 0.1, 0.1), 0.0);
        assert_eq!(dead_zone(0.9, 0.1, 0.1), 1.0);
    }

    #[test]
    fn test_dead_zone_signed_preserves_sign() {
        assert!((dead_zone_signed(-0.55, 0.1, 0.1) + 0.5625).abs() < EPSILON);
        assert!((dead_zone_signed(0.55, 0.1, 0.1) - 0.5625).abs() < EPSILON);
        assert_eq!(dead_zone_signed(-0.05, 0.1, 0.0), 0.0);
    }

    // ==================== Polar Conversion Tests ====================

    #[test]
    fn test_polar_round_trip_inside_unit_circle() {
        let points = [(0.0, 0.0), (1.0, 0.0), (0.0, -1.0), (0.3, 0.4), (-0.5, 0.5), (-0.7, -0.1)];
        for (x, y) in points {
            let (angle, radius) = cartesian_to_polar(x, y);
            let (rx, ry) = polar_to_cartesian(angle, radius);
            assert!((rx - x).abs() < EPSILON && (ry - y).abs() < EPSILON, "({}, {})", x, y);
        }
    }

    #[test]
    fn test_cartesian_to_polar_radius() {
        let (_, radius) = cartesian_to_polar(0.3, 0.4);
        assert!((radius - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_normalized_angle_compass_points() {
        assert!(radians_to_normalized(FRAC_PI_2).abs() < EPSILON); // up
        assert!((radians_to_normalized(0.0) - 0.25).abs() < EPSILON); // right
        assert!((radians_to_normalized(-FRAC_PI_2) - 0.5).abs() < EPSILON); // down
        assert!((radians_to_normalized(PI) - 0.75).abs() < EPSILON); // left
    }

    #[test]
    fn test_normalized_angle_stays_below_one() {
        for i in -720..=720 {
            let n = radians_to_normalized((i as f32).to_radians());
            assert!((0.0..1.0).contains(&n), "{} -> {}", i, n);
        }
    }

    #[test]
    fn test_wrap_normalized() {
        assert_eq!(wrap_normalized(1.25), 0.25);
        assert_eq!(wrap_normalized(-0.25), 0.75);
        assert_eq!(wrap_normalized(1.0), 0.0);
        assert!(wrap_normalized(-1e-9) < 1.0);
    }

    #[test]
    fn test_normalized_to_radians_inverts() {
        for n in [0.0, 0.1, 0.25, 0.6, 0.75, 0.99] {
            let back = radians_to_normalized(normalized_to_radians(n));
            assert!((back - n).abs() < 1e-4, "{} -> {}", n, back);
        }
    }

    // ==================== Misc Tests ====================

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate(0.0, 1.0, 0.0), 0.0);
        assert_eq!(interpolate(0.0, 1.0, 1.0), 1.0);
        assert!((interpolate(-1.0, 1.0, 0.25) + 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-1.5), -1.0);
        assert_eq!(clamp01(-0.1), 0.0);
        assert_eq!(clamp01(0.4), 0.4);
    }

    #[test]
    fn test_elapsed_from_secs() {
        assert_eq!(elapsed_from_secs(-1.0).unwrap(), Duration::ZERO);
        assert_eq!(elapsed_from_secs(0.25).unwrap(), Duration::from_millis(250));
        assert_eq!(elapsed_from_secs(f64::INFINITY).unwrap(), Duration::MAX);
        assert!(matches!(
            elapsed_from_secs(f64::NAN),
            Err(EngineError::InvalidArgument(_))
        ));
    }
}
