//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) produces a usable configuration.
//!
//! ```toml
//! [device]
//! path = "/dev/input/event3"
//! tick_rate_hz = 120
//!
//! [dispatch]
//! mode = "deferred"
//!
//! [sticks]
//! inner_dead_zone = 0.08
//! expo = 0.3
//!
//! [triggers]
//! inner_dead_zone = 0.1
//!
//! [buttons]
//! hold_ms = 500
//! repeat = ["dpad_up", "dpad_down"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::axis::{Joystick, JoystickSettings, Shaping, Trigger, TriggerSettings};
use crate::controller::Button;
use crate::error::{EngineError, Result};
use crate::event::RepeatSettings;
use crate::notify::DispatchMode;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub sticks: StickConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub buttons: ButtonConfig,
}

/// Input device configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// evdev node to open. Empty means scan `/dev/input` for a gamepad.
    #[serde(default)]
    pub path: String,

    /// Gamepad update rate
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: u32,
}

/// Notification dispatch configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub mode: DispatchMode,
}

/// Analog stick configuration, applied to both sticks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StickConfig {
    #[serde(default = "default_stick_dead_zone")]
    pub inner_dead_zone: f32,

    #[serde(default)]
    pub outer_dead_zone: f32,

    #[serde(default)]
    pub invert_x: bool,

    #[serde(default)]
    pub invert_y: bool,

    /// Cubic expo on the stick radius (0.0 = linear, 1.0 = full cubic)
    #[serde(default)]
    pub expo: f32,

    #[serde(default)]
    pub smoothing_factor: f32,

    #[serde(default = "default_smoothing_period")]
    pub smoothing_period_ms: u64,
}

/// Analog trigger configuration, applied to both triggers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerConfig {
    #[serde(default = "default_trigger_dead_zone")]
    pub inner_dead_zone: f32,

    #[serde(default)]
    pub outer_dead_zone: f32,

    #[serde(default)]
    pub invert: bool,

    #[serde(default)]
    pub expo: f32,

    #[serde(default)]
    pub smoothing_factor: f32,

    #[serde(default = "default_smoothing_period")]
    pub smoothing_period_ms: u64,
}

/// Button event configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ButtonConfig {
    /// Press duration that fires a `<button>.hold` event
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,

    #[serde(default = "default_repeat_initial_delay")]
    pub repeat_initial_delay_ms: u64,

    #[serde(default = "default_repeat_delay")]
    pub repeat_delay_ms: u64,

    /// Factor applied to the repeat delay after every repeat (> 1 accelerates)
    #[serde(default = "default_acceleration_ratio")]
    pub acceleration_ratio: f64,

    #[serde(default = "default_min_repeat_delay")]
    pub min_repeat_delay_ms: u64,

    #[serde(default = "default_max_repeat_delay")]
    pub max_repeat_delay_ms: u64,

    /// Buttons that get a `<button>.repeat` event
    #[serde(default = "default_repeat_buttons")]
    pub repeat: Vec<String>,
}

// Default value functions
fn default_tick_rate() -> u32 { 120 }
fn default_stick_dead_zone() -> f32 { 0.05 }
fn default_trigger_dead_zone() -> f32 { 0.1 }
fn default_smoothing_period() -> u64 { 50 }
fn default_hold_ms() -> u64 { 500 }
fn default_repeat_initial_delay() -> u64 { 400 }
fn default_repeat_delay() -> u64 { 100 }
fn default_acceleration_ratio() -> f64 { 1.25 }
fn default_min_repeat_delay() -> u64 { 30 }
fn default_max_repeat_delay() -> u64 { 500 }
fn default_repeat_buttons() -> Vec<String> {
    [Button::DpadUp, Button::DpadDown, Button::DpadLeft, Button::DpadRight]
        .iter()
        .map(|b| b.name().to_string())
        .collect()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            tick_rate_hz: default_tick_rate(),
        }
    }
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            inner_dead_zone: default_stick_dead_zone(),
            outer_dead_zone: 0.0,
            invert_x: false,
            invert_y: false,
            expo: 0.0,
            smoothing_factor: 0.0,
            smoothing_period_ms: default_smoothing_period(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            inner_dead_zone: default_trigger_dead_zone(),
            outer_dead_zone: 0.0,
            invert: false,
            expo: 0.0,
            smoothing_factor: 0.0,
            smoothing_period_ms: default_smoothing_period(),
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            hold_ms: default_hold_ms(),
            repeat_initial_delay_ms: default_repeat_initial_delay(),
            repeat_delay_ms: default_repeat_delay(),
            acceleration_ratio: default_acceleration_ratio(),
            min_repeat_delay_ms: default_min_repeat_delay(),
            max_repeat_delay_ms: default_max_repeat_delay(),
            repeat: default_repeat_buttons(),
        }
    }
}

fn expo_shaping(expo: f32) -> Option<Shaping> {
    (expo > 0.0).then(|| Shaping::expo(expo))
}

impl StickConfig {
    #[must_use]
    pub fn settings(&self) -> JoystickSettings {
        JoystickSettings {
            inner_dead_zone: self.inner_dead_zone,
            outer_dead_zone: self.outer_dead_zone,
            invert_x: self.invert_x,
            invert_y: self.invert_y,
            radius_shaping: expo_shaping(self.expo),
            smoothing_factor: self.smoothing_factor,
            smoothing_period: Duration::from_millis(self.smoothing_period_ms),
            ..JoystickSettings::default()
        }
    }

    /// Replaces the stick's settings with this section.
    pub fn apply_to_joystick(&self, stick: &mut Joystick) -> Result<()> {
        stick.set_settings(self.settings())
    }
}

impl TriggerConfig {
    #[must_use]
    pub fn settings(&self) -> TriggerSettings {
        TriggerSettings {
            inner_dead_zone: self.inner_dead_zone,
            outer_dead_zone: self.outer_dead_zone,
            invert: self.invert,
            shaping: expo_shaping(self.expo),
            smoothing_factor: self.smoothing_factor,
            smoothing_period: Duration::from_millis(self.smoothing_period_ms),
        }
    }

    /// Replaces the trigger's settings with this section.
    pub fn apply_to_trigger(&self, trigger: &mut Trigger) -> Result<()> {
        trigger.set_settings(self.settings())
    }
}

impl ButtonConfig {
    #[must_use]
    pub fn hold_duration(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    #[must_use]
    pub fn repeat_settings(&self) -> RepeatSettings {
        RepeatSettings {
            initial_delay: Duration::from_millis(self.repeat_initial_delay_ms),
            repeat_delay: Duration::from_millis(self.repeat_delay_ms),
            acceleration_ratio: self.acceleration_ratio,
            min_repeat_delay: Duration::from_millis(self.min_repeat_delay_ms),
            max_repeat_delay: Duration::from_millis(self.max_repeat_delay_ms),
        }
    }

    /// Buttons listed under `repeat`, parsed.
    pub fn repeat_buttons(&self) -> Result<Vec<Button>> {
        self.repeat.iter().map(|name| name.parse()).collect()
    }
}

fn invalid(message: &str) -> EngineError {
    use serde::de::Error;
    EngineError::Config(toml::de::Error::custom(message))
}

fn check_zone(value: f32, message: &str) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(message))
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is within the range the engine accepts
    pub fn validate(&self) -> Result<()> {
        if self.device.tick_rate_hz == 0 || self.device.tick_rate_hz > 1000 {
            return Err(invalid("tick_rate_hz must be between 1 and 1000"));
        }

        check_zone(self.sticks.inner_dead_zone, "sticks.inner_dead_zone must be between 0.0 and 1.0")?;
        check_zone(self.sticks.outer_dead_zone, "sticks.outer_dead_zone must be between 0.0 and 1.0")?;
        check_zone(self.sticks.expo, "sticks.expo must be between 0.0 and 1.0")?;
        check_zone(self.sticks.smoothing_factor, "sticks.smoothing_factor must be between 0.0 and 1.0")?;

        check_zone(self.triggers.inner_dead_zone, "triggers.inner_dead_zone must be between 0.0 and 1.0")?;
        check_zone(self.triggers.outer_dead_zone, "triggers.outer_dead_zone must be between 0.0 and 1.0")?;
        check_zone(self.triggers.expo, "triggers.expo must be between 0.0 and 1.0")?;
        check_zone(self.triggers.smoothing_factor, "triggers.smoothing_factor must be between 0.0 and 1.0")?;

        let buttons = &self.buttons;
        if !(buttons.acceleration_ratio > 0.0 && buttons.acceleration_ratio.is_finite()) {
            return Err(invalid("acceleration_ratio must be a positive number"));
        }
        if buttons.min_repeat_delay_ms > buttons.max_repeat_delay_ms {
            return Err(invalid("min_repeat_delay_ms must not exceed max_repeat_delay_ms"));
        }
        if let Err(e) = buttons.repeat_buttons() {
            return Err(invalid(&e.to_string()));
        }

        Ok(())
    }

    /// Tick interval derived from `tick_rate_hz`
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.device.tick_rate_hz.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_tick_rate_zero() {
        let mut config = create_valid_config();
        config.device.tick_rate_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_tick_rate_too_high() {
        let mut config = create_valid_config();
        config.device.tick_rate_hz = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_tick_rate_boundaries() {
        let mut config = create_valid_config();
        config.device.tick_rate_hz = 1;
        assert!(config.validate().is_ok());
        config.device.tick_rate_hz = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_stick_dead_zone() {
        let mut config = create_valid_config();
        config.sticks.inner_dead_zone = 1.5;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.sticks.outer_dead_zone = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_trigger_expo() {
        let mut config = create_valid_config();
        config.triggers.expo = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_smoothing_factor_rejected() {
        let mut config = create_valid_config();
        config.sticks.smoothing_factor = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_acceleration_ratio() {
        let mut config = create_valid_config();
        config.buttons.acceleration_ratio = 0.0;
        assert!(config.validate().is_err());

        config.buttons.acceleration_ratio = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_repeat_delay_bounds() {
        let mut config = create_valid_config();
        config.buttons.min_repeat_delay_ms = 600;
        config.buttons.max_repeat_delay_ms = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_repeat_button_rejected() {
        let mut config = create_valid_config();
        config.buttons.repeat.push("paddle".to_string());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_tick_rate(), 120);
        assert_eq!(default_stick_dead_zone(), 0.05);
        assert_eq!(default_trigger_dead_zone(), 0.1);
        assert_eq!(default_hold_ms(), 500);
        assert_eq!(default_repeat_initial_delay(), 400);
        assert_eq!(default_repeat_delay(), 100);
        assert_eq!(default_acceleration_ratio(), 1.25);
        assert_eq!(default_min_repeat_delay(), 30);
        assert_eq!(default_max_repeat_delay(), 500);
        assert_eq!(default_repeat_buttons().len(), 4);
    }

    #[test]
    fn test_tick_interval() {
        let mut config = create_valid_config();
        config.device.tick_rate_hz = 100;
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_repeat_settings_conversion() {
        let settings = create_valid_config().buttons.repeat_settings();
        assert_eq!(settings.initial_delay, Duration::from_millis(400));
        assert_eq!(settings.repeat_delay, Duration::from_millis(100));
        assert_eq!(settings.min_repeat_delay, Duration::from_millis(30));
        assert_eq!(settings.max_repeat_delay, Duration::from_millis(500));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_repeat_buttons_parsed() {
        let buttons = create_valid_config().buttons.repeat_buttons().unwrap();
        assert_eq!(
            buttons,
            vec![Button::DpadUp, Button::DpadDown, Button::DpadLeft, Button::DpadRight]
        );
    }

    #[test]
    fn test_stick_settings_conversion() {
        let mut config = create_valid_config();
        config.sticks.expo = 0.0;
        assert!(config.sticks.settings().radius_shaping.is_none());

        config.sticks.expo = 0.4;
        config.sticks.invert_y = true;
        let settings = config.sticks.settings();
        assert!(matches!(settings.radius_shaping, Some(Shaping::Expo(_))));
        assert!(settings.invert_y);
        assert_eq!(settings.smoothing_period, Duration::from_millis(50));
    }

    #[test]
    fn test_apply_to_axes() {
        let config = create_valid_config();
        let mut stick = Joystick::default();
        let mut trigger = Trigger::default();
        config.sticks.apply_to_joystick(&mut stick).unwrap();
        config.triggers.apply_to_trigger(&mut trigger).unwrap();
        assert_eq!(stick.settings().inner_dead_zone, 0.05);
        assert_eq!(trigger.settings().inner_dead_zone, 0.1);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.device.tick_rate_hz, 120);
        assert_eq!(config.dispatch.mode, DispatchMode::Deferred);
        assert_eq!(config.buttons.hold_ms, 500);
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[device]
path = "/dev/input/event7"
tick_rate_hz = 250

[dispatch]
mode = "immediate"

[sticks]
inner_dead_zone = 0.08
invert_y = true
expo = 0.3

[triggers]
invert = true

[buttons]
hold_ms = 750
acceleration_ratio = 1.5
repeat = ["south", "dpad_left"]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.device.path, "/dev/input/event7");
        assert_eq!(config.device.tick_rate_hz, 250);
        assert_eq!(config.dispatch.mode, DispatchMode::Immediate);
        assert_eq!(config.sticks.inner_dead_zone, 0.08);
        assert!(config.sticks.invert_y);
        assert!(config.triggers.invert);
        assert_eq!(config.triggers.inner_dead_zone, 0.1);
        assert_eq!(config.buttons.hold_ms, 750);
        assert_eq!(config.buttons.repeat_delay_ms, 100);
        assert_eq!(
            config.buttons.repeat_buttons().unwrap(),
            vec![Button::South, Button::DpadLeft]
        );
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[device]\ntick_rate_hz = 0\n")
            .unwrap();
        assert!(matches!(
            Config::load(temp_file.path()),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/padwatch.toml"),
            Err(EngineError::Io(_))
        ));
    }
}
