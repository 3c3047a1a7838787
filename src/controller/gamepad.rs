//! # Gamepad
//!
//! Composition of one physical controller: button handles, two sticks, two
//! triggers and the event group fed from them.
//!
//! ## Tick Order
//!
//! [`Gamepad::update`] runs the same steps every tick:
//!
//! 1. Swap the raw buffers and store the new sample as `current`
//! 2. Drive every button from the bitmask
//! 3. Ingest and validate the four analog axes
//! 4. Tick the event group
//! 5. Dispatch the gamepad's queued notifications
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//! use gamepad_dynamics::config::Config;
//! use gamepad_dynamics::controller::{Button, Gamepad, RawSample};
//! use gamepad_dynamics::event::EventArgs;
//!
//! let mut pad = Gamepad::from_config(&Config::default()).unwrap();
//! pad.add_listener(Rc::new(|source: &str, _: &EventArgs| println!("{}", source)));
//! pad.connect();
//!
//! let mut sample = RawSample::new();
//! sample.set_button(Button::South, true);
//! pad.update(&sample, Duration::from_millis(8)).unwrap(); // prints "south.press"
//! assert!(pad.just_pressed(Button::South));
//! ```

use std::mem;
use std::time::Duration;
use tracing::{debug, trace};

use crate::axis::math::elapsed_from_secs;
use crate::axis::{Joystick, Trigger};
use crate::config::{ButtonConfig, Config};
use crate::error::Result;
use crate::event::{
    ButtonDriver, ButtonEdgeEvent, DigitalButtonState, DynamicEvent, EventGroup, EventListener,
    HoldEvent, RepeatEvent,
};
use crate::notify::{DispatchMode, Notifier, PropertyListener};

use super::buttons::Button;
use super::state::RawSample;

const BUTTON_COUNT: usize = Button::ALL.len();

/// Gamepad-level properties that raise change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadProperty {
    Connected,
    /// The pressed-button set changed this tick.
    Buttons,
}

/// One controller's processed input state.
#[derive(Debug)]
pub struct Gamepad {
    notifier: Notifier<GamepadProperty>,
    connected: bool,

    previous: RawSample,
    current: RawSample,

    drivers: [ButtonDriver; BUTTON_COUNT],
    left_stick: Joystick,
    right_stick: Joystick,
    left_trigger: Trigger,
    right_trigger: Trigger,

    events: EventGroup,
}

impl Default for Gamepad {
    fn default() -> Self {
        Self::new(DispatchMode::default())
    }
}

impl Gamepad {
    /// Creates a disconnected gamepad with default axis settings and no
    /// registered events.
    #[must_use]
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            notifier: Notifier::new(mode),
            connected: false,
            previous: RawSample::default(),
            current: RawSample::default(),
            drivers: std::array::from_fn(|_| DigitalButtonState::driven().1),
            left_stick: Joystick::new(mode),
            right_stick: Joystick::new(mode),
            left_trigger: Trigger::new(mode),
            right_trigger: Trigger::new(mode),
            events: EventGroup::new("gamepad"),
        }
    }

    /// Creates a disconnected gamepad tuned from `config`, with press,
    /// release and hold events on every button plus repeat events on the
    /// buttons listed in `[buttons] repeat`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mode = config.dispatch.mode;
        let mut pad = Self {
            left_stick: Joystick::with_settings(mode, config.sticks.settings())?,
            right_stick: Joystick::with_settings(mode, config.sticks.settings())?,
            left_trigger: Trigger::with_settings(mode, config.triggers.settings())?,
            right_trigger: Trigger::with_settings(mode, config.triggers.settings())?,
            ..Self::new(mode)
        };

        let repeating = config.buttons.repeat_buttons()?;
        for button in Button::ALL {
            pad.add_button_events(button, &config.buttons, repeating.contains(&button))?;
        }
        Ok(pad)
    }

    /// Registers `<button>.press`, `<button>.release`, `<button>.hold` and,
    /// if `repeat` is set, `<button>.repeat`.
    pub fn add_button_events(
        &mut self,
        button: Button,
        config: &ButtonConfig,
        repeat: bool,
    ) -> Result<()> {
        let state = self.button(button);
        let name = button.name();

        // Built before anything is registered so a bad config adds nothing.
        let repeat_event = if repeat {
            Some(RepeatEvent::new(
                format!("{}.repeat", name),
                state.clone(),
                config.repeat_settings(),
            )?)
        } else {
            None
        };

        self.events.add(Box::new(ButtonEdgeEvent::press(
            format!("{}.press", name),
            state.clone(),
        )));
        self.events.add(Box::new(ButtonEdgeEvent::release(
            format!("{}.release", name),
            state.clone(),
        )));
        self.events.add(Box::new(HoldEvent::new(
            format!("{}.hold", name),
            state,
            config.hold_duration(),
        )));
        if let Some(event) = repeat_event {
            self.events.add(Box::new(event));
        }
        Ok(())
    }

    // ---- connection ----

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Starts accepting samples.
    pub fn connect(&mut self) {
        if self.notifier.set_property(&mut self.connected, true, GamepadProperty::Connected) {
            debug!("Gamepad connected");
        }
        self.notifier.dispatch_all();
    }

    /// Stops accepting samples and returns every input to neutral.
    ///
    /// Events are ticked once against the neutral state so they re-arm, which
    /// fires release events for buttons that were held. Notifications still
    /// queued on the gamepad or its axes are dropped.
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }

        self.previous = RawSample::default();
        self.current = RawSample::default();
        for driver in &self.drivers {
            driver.reset();
        }
        self.events.update(Duration::ZERO);
        self.left_stick.reset();
        self.right_stick.reset();
        self.left_trigger.reset();
        self.right_trigger.reset();

        let dropped = self.notifier.clear_queued()
            + self.left_stick.notifier().clear_queued()
            + self.right_stick.notifier().clear_queued()
            + self.left_trigger.notifier().clear_queued()
            + self.right_trigger.notifier().clear_queued();

        self.notifier
            .set_property(&mut self.connected, false, GamepadProperty::Connected);
        debug!("Gamepad disconnected ({} queued notifications dropped)", dropped);
        self.notifier.dispatch_all();
    }

    // ---- tick ----

    /// Processes one raw sample.
    ///
    /// Ignored while disconnected. If an axis fails validation (a shaping
    /// function returned NaN) the rest of the tick still runs and the first
    /// such error is returned at the end.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`](crate::error::EngineError::InvalidArgument)
    /// for a sample containing NaN, before any state changes.
    pub fn update(&mut self, sample: &RawSample, elapsed: Duration) -> Result<()> {
        if !self.connected {
            trace!("Sample ignored while disconnected");
            return Ok(());
        }
        sample.check()?;

        mem::swap(&mut self.previous, &mut self.current);
        self.current = *sample;

        for button in Button::ALL {
            self.drivers[button.index()].update(sample.is_pressed(button), elapsed);
        }
        if self.previous.buttons != self.current.buttons {
            self.notifier.notify(GamepadProperty::Buttons);
        }

        self.left_stick
            .update_raw(sample.left_stick.x, sample.left_stick.y, elapsed)?;
        self.right_stick
            .update_raw(sample.right_stick.x, sample.right_stick.y, elapsed)?;
        self.left_trigger.update_raw(sample.left_trigger, elapsed)?;
        self.right_trigger.update_raw(sample.right_trigger, elapsed)?;

        let validated = [
            self.left_stick.validate(),
            self.right_stick.validate(),
            self.left_trigger.validate(),
            self.right_trigger.validate(),
        ];

        self.events.update(elapsed);
        self.notifier.dispatch_all();

        validated.into_iter().collect()
    }

    /// [`update`](Self::update) with elapsed time in seconds.
    pub fn update_secs(&mut self, sample: &RawSample, secs: f64) -> Result<()> {
        let elapsed = elapsed_from_secs(secs)?;
        self.update(sample, elapsed)
    }

    // ---- buttons ----

    #[must_use]
    pub fn is_pressed(&self, button: Button) -> bool {
        self.current.is_pressed(button)
    }

    /// Pressed this tick, released the tick before.
    #[must_use]
    pub fn just_pressed(&self, button: Button) -> bool {
        self.current.is_pressed(button) && !self.previous.is_pressed(button)
    }

    /// Released this tick, pressed the tick before.
    #[must_use]
    pub fn just_released(&self, button: Button) -> bool {
        !self.current.is_pressed(button) && self.previous.is_pressed(button)
    }

    /// Read handle on a button, for building custom events.
    #[must_use]
    pub fn button(&self, button: Button) -> DigitalButtonState {
        self.drivers[button.index()].state()
    }

    #[must_use]
    pub fn previous(&self) -> &RawSample {
        &self.previous
    }

    #[must_use]
    pub fn current(&self) -> &RawSample {
        &self.current
    }

    // ---- axes ----

    #[must_use]
    pub fn left_stick(&self) -> &Joystick {
        &self.left_stick
    }

    pub fn left_stick_mut(&mut self) -> &mut Joystick {
        &mut self.left_stick
    }

    #[must_use]
    pub fn right_stick(&self) -> &Joystick {
        &self.right_stick
    }

    pub fn right_stick_mut(&mut self) -> &mut Joystick {
        &mut self.right_stick
    }

    #[must_use]
    pub fn left_trigger(&self) -> &Trigger {
        &self.left_trigger
    }

    pub fn left_trigger_mut(&mut self) -> &mut Trigger {
        &mut self.left_trigger
    }

    #[must_use]
    pub fn right_trigger(&self) -> &Trigger {
        &self.right_trigger
    }

    pub fn right_trigger_mut(&mut self) -> &mut Trigger {
        &mut self.right_trigger
    }

    // ---- events and notification ----

    /// Adds an event ticked with the gamepad. Returns its index in the group.
    pub fn add_event(&mut self, event: Box<dyn DynamicEvent>) -> usize {
        self.events.add(event)
    }

    #[must_use]
    pub fn events(&self) -> &EventGroup {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventGroup {
        &mut self.events
    }

    /// Listens to every event registered on this gamepad.
    pub fn add_listener(&mut self, listener: EventListener) -> bool {
        self.events.add_listener(listener)
    }

    pub fn remove_listener(&mut self, listener: &EventListener) -> bool {
        self.events.remove_listener(listener)
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier<GamepadProperty> {
        &self.notifier
    }

    pub fn subscribe(&self, listener: PropertyListener<GamepadProperty>) -> bool {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, listener: &PropertyListener<GamepadProperty>) -> bool {
        self.notifier.unsubscribe(listener)
    }
}
