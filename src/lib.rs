//! # Gamepad Dynamics Library
//!
//! Time-driven gamepad input processing.
//!
//! This library turns raw per-tick controller samples into higher-level
//! input: timed button events, accelerating auto-repeat, and shaped,
//! smoothed analog axes with change notification.
//!
//! - [`notify`]: property-change notification with immediate or deferred dispatch
//! - [`event`]: dynamic events, event groups and activation conditions
//! - [`axis`]: axis math, sliding-window averaging, joysticks and triggers
//! - [`controller`]: the gamepad composition and the evdev sample source
//! - [`config`]: TOML configuration

pub mod axis;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod notify;
