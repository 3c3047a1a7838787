//! # evdev Raw-Sample Source
//!
//! Reads a Linux gamepad through evdev and folds its events into a
//! [`RawSample`].
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Default Range | Normalized |
//! |------|------------|---------------|------------|
//! | Left Stick X | ABS_X | 0-255 | -1 left .. 1 right |
//! | Left Stick Y | ABS_Y | 0-255 | -1 down .. 1 up |
//! | Right Stick X | ABS_Z | 0-255 | -1 left .. 1 right |
//! | Right Stick Y | ABS_RZ | 0-255 | -1 down .. 1 up |
//! | L2 Trigger | ABS_RX | 0-255 | 0 .. 1 |
//! | R2 Trigger | ABS_RY | 0-255 | 0 .. 1 |
//! | D-Pad X | ABS_HAT0X | -1/0/1 | left / right bits |
//! | D-Pad Y | ABS_HAT0Y | -1/0/1 | up / down bits |
//!
//! Buttons follow the table in [`buttons`](super::buttons).
//!
//! ## Usage
//!
//! ```no_run
//! use gamepad_dynamics::controller::evdev::{EvdevGamepad, EvdevMapper};
//!
//! let mut pad = EvdevGamepad::open()?;
//! let mut mapper = EvdevMapper::new();
//!
//! for event in pad.fetch_events()? {
//!     mapper.process_event(&event);
//! }
//! let sample = mapper.sample();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use evdev::{AbsoluteAxisType, Device, EventStream, InputEvent, InputEventKind, Key};
use std::path::Path;
use tracing::{debug, info};

use super::buttons::{Button, ButtonMask};
use super::state::RawSample;
use crate::error::{EngineError, Result};

/// Integer range reported by an absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl Default for AxisRange {
    /// The 8-bit range used by DualSense and most HID gamepads.
    fn default() -> Self {
        Self { min: 0, max: 255 }
    }
}

impl AxisRange {
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Rest position of a centred axis. For `0..=255` this is `128`.
    #[must_use]
    pub fn center(&self) -> i32 {
        self.min + (self.max - self.min + 1) / 2
    }

    /// Maps to `[-1, 1]`, `0` at [`AxisRange::center`].
    #[must_use]
    pub fn normalize_centered(&self, value: i32) -> f32 {
        let center = self.center();
        let span = if value >= center {
            self.max - center
        } else {
            center - self.min
        };
        if span <= 0 {
            return 0.0;
        }
        ((value - center) as f32 / span as f32).clamp(-1.0, 1.0)
    }

    /// Maps to `[0, 1]`, `0` at `min`.
    #[must_use]
    pub fn normalize_unit(&self, value: i32) -> f32 {
        let span = self.max - self.min;
        if span <= 0 {
            return 0.0;
        }
        ((value - self.min) as f32 / span as f32).clamp(0.0, 1.0)
    }
}

/// Folds evdev events into a [`RawSample`].
///
/// Not thread-safe. Use from a single task only.
#[derive(Debug, Default)]
pub struct EvdevMapper {
    sample: RawSample,
    stick_range: AxisRange,
    trigger_range: AxisRange,
}

impl EvdevMapper {
    /// Creates a mapper for 8-bit sticks and triggers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper for devices reporting other ranges.
    #[must_use]
    pub fn with_ranges(stick_range: AxisRange, trigger_range: AxisRange) -> Self {
        Self {
            sample: RawSample::default(),
            stick_range,
            trigger_range,
        }
    }

    /// Current accumulated state.
    #[must_use]
    pub fn sample(&self) -> RawSample {
        self.sample
    }

    /// Applies one event. Sync, misc and unknown events are ignored.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            InputEventKind::Key(key) => self.process_key_event(key, event.value() != 0),
            _ => {}
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let sticks = self.stick_range;
        let triggers = self.trigger_range;
        match axis {
            AbsoluteAxisType::ABS_X => self.sample.left_stick.x = sticks.normalize_centered(value),
            // evdev Y grows downward
            AbsoluteAxisType::ABS_Y => self.sample.left_stick.y = -sticks.normalize_centered(value),
            AbsoluteAxisType::ABS_Z => self.sample.right_stick.x = sticks.normalize_centered(value),
            AbsoluteAxisType::ABS_RZ => {
                self.sample.right_stick.y = -sticks.normalize_centered(value)
            }

            AbsoluteAxisType::ABS_RX => self.sample.left_trigger = triggers.normalize_unit(value),
            AbsoluteAxisType::ABS_RY => self.sample.right_trigger = triggers.normalize_unit(value),

            AbsoluteAxisType::ABS_HAT0X => {
                self.sample.set_button(Button::DpadLeft, value < 0);
                self.sample.set_button(Button::DpadRight, value > 0);
            }
            AbsoluteAxisType::ABS_HAT0Y => {
                self.sample.set_button(Button::DpadUp, value < 0);
                self.sample.set_button(Button::DpadDown, value > 0);
            }

            _ => {
                // gyro, accelerometer, touch positions
            }
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        if let Some(button) = button_for_key(key) {
            self.sample.set_button(button, pressed);
        }
    }

    /// Back to the neutral sample. Ranges are kept.
    pub fn reset(&mut self) {
        self.sample = RawSample::default();
    }
}

fn button_for_key(key: Key) -> Option<Button> {
    let button = match key {
        Key::BTN_SOUTH => Button::South,
        Key::BTN_EAST => Button::East,
        Key::BTN_WEST => Button::West,
        Key::BTN_NORTH => Button::North,
        Key::BTN_TL => Button::L1,
        Key::BTN_TR => Button::R1,
        Key::BTN_TL2 => Button::L2,
        Key::BTN_TR2 => Button::R2,
        Key::BTN_SELECT => Button::Select,
        Key::BTN_START => Button::Start,
        Key::BTN_MODE => Button::Mode,
        Key::BTN_THUMBL => Button::L3,
        Key::BTN_THUMBR => Button::R3,
        Key::BTN_TOUCH => Button::Touchpad,
        Key::BTN_DPAD_UP => Button::DpadUp,
        Key::BTN_DPAD_DOWN => Button::DpadDown,
        Key::BTN_DPAD_LEFT => Button::DpadLeft,
        Key::BTN_DPAD_RIGHT => Button::DpadRight,
        _ => return None,
    };
    Some(button)
}

/// Checks whether a device looks like a gamepad: face buttons plus sticks.
fn is_gamepad(device: &Device) -> bool {
    let has_buttons = device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
    let has_sticks = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));
    has_buttons && has_sticks
}

/// Open evdev gamepad.
pub struct EvdevGamepad {
    device: Device,
    device_path: String,
}

impl EvdevGamepad {
    /// Opens the first gamepad under `/dev/input`.
    ///
    /// Devices are tried in path order; ones that cannot be opened are
    /// skipped.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no device reports gamepad buttons and sticks
    /// - `Controller`: `/dev/input` is missing or unreadable
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(EngineError::Controller(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| EngineError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EngineError::Controller(format!("Failed to read directory entry: {}", e)))?;

        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );
                    if is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found gamepad at: {}", device_path);
                        return Ok(Self { device, device_path });
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(EngineError::ControllerNotFound)
    }

    /// Opens a specific event node.
    ///
    /// # Errors
    ///
    /// `Io` if the node cannot be opened, `ControllerNotFound` if it is not a
    /// gamepad.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path)?;
        if !is_gamepad(&device) {
            debug!("{} is not a gamepad", path.display());
            return Err(EngineError::ControllerNotFound);
        }
        let device_path = path.to_string_lossy().to_string();
        info!("Opened gamepad at: {}", device_path);
        Ok(Self { device, device_path })
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Buttons this device can report, for diagnostics.
    #[must_use]
    pub fn supported_buttons(&self) -> ButtonMask {
        device_buttons(&self.device)
    }

    /// Fetches pending events. Blocks if none are available.
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| EngineError::Controller(format!("Failed to fetch events: {}", e)))
    }

    /// Converts into an async event stream for use under tokio.
    pub fn into_event_stream(self) -> Result<EventStream> {
        self.device
            .into_event_stream()
            .map_err(|e| EngineError::Controller(format!("Failed to create event stream: {}", e)))
    }
}

/// Mask of buttons a device can report.
fn device_buttons(device: &Device) -> ButtonMask {
    let mut mask = ButtonMask::empty();
    if let Some(keys) = device.supported_keys() {
        for key in keys.iter() {
            if let Some(button) = button_for_key(key) {
                mask |= button.mask();
            }
        }
    }
    if let Some(axes) = device.supported_absolute_axes() {
        if axes.contains(AbsoluteAxisType::ABS_HAT0X) {
            mask |= ButtonMask::DPAD_LEFT | ButtonMask::DPAD_RIGHT;
        }
        if axes.contains(AbsoluteAxisType::ABS_HAT0Y) {
            mask |= ButtonMask::DPAD_UP | ButtonMask::DPAD_DOWN;
        }
    }
    mask
}
