//! # Controller Module
//!
//! Gamepad composition on top of the event and axis engines.
//!
//! This module handles:
//! - Button identifiers and the pressed-button bitmask
//! - Raw per-tick samples handed in by a raw-sample source
//! - The [`Gamepad`] that turns samples into button state, axis state and events
//! - Reading samples from Linux evdev devices

pub mod buttons;
pub mod evdev;
pub mod gamepad;
pub mod state;

pub use buttons::{Button, ButtonMask};
pub use gamepad::{Gamepad, GamepadProperty};
pub use state::RawSample;
