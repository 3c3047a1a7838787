//! # Activation Conditions
//!
//! Generic timing state machine over a boolean predicate.
//!
//! The condition is either inactive or active. A predicate sample is taken
//! every tick; the condition activates once the predicate has been true for
//! `activation_delay`, and deactivates once it has been false for
//! `deactivation_delay` or once it has been active for `active_timeout`.
//!
//! A timeout-forced deactivation blocks re-activation until the predicate
//! flips to false and back to true.
//!
//! ## Live Args
//!
//! Listeners receive an [`ActivationArgs`] view over the condition's own
//! state. A listener that keeps the args and reads them later sees the
//! condition as it is *then*, not as it was when the event fired. Snapshot the
//! values inside the callback if the history matters.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//! use gamepad_dynamics::event::{ActivationCondition, DynamicEvent, TriggerMode};
//!
//! let input = Rc::new(Cell::new(false));
//! let sample = input.clone();
//! let mut condition = ActivationCondition::new("charge", move || sample.get())
//!     .with_activation_delay(Duration::from_millis(20))
//!     .with_trigger_mode(TriggerMode::OnActivation);
//!
//! input.set(true);
//! condition.update(Duration::from_millis(10));
//! assert!(!condition.is_active());
//! condition.update(Duration::from_millis(10));
//! assert!(condition.is_active());
//! ```

use serde::Deserialize;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

use super::{raise, DynamicEvent, EventArgs, EventListeners};
use crate::error::EngineError;

/// When an [`ActivationCondition`] fires its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Never fires.
    Never,
    /// Fires on the inactive -> active transition.
    #[default]
    OnActivation,
    /// Fires on the active -> inactive transition.
    OnDeactivation,
    /// Fires on both transitions.
    OnActivationAndDeactivation,
    /// Fires on every tick spent active.
    WhileActive,
}

impl TriggerMode {
    fn fires_on_activation(self) -> bool {
        matches!(
            self,
            TriggerMode::OnActivation | TriggerMode::OnActivationAndDeactivation
        )
    }

    fn fires_on_deactivation(self) -> bool {
        matches!(
            self,
            TriggerMode::OnDeactivation | TriggerMode::OnActivationAndDeactivation
        )
    }
}

impl TryFrom<u8> for TriggerMode {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TriggerMode::Never),
            1 => Ok(TriggerMode::OnActivation),
            2 => Ok(TriggerMode::OnDeactivation),
            3 => Ok(TriggerMode::OnActivationAndDeactivation),
            4 => Ok(TriggerMode::WhileActive),
            other => Err(EngineError::InvalidArgument(format!(
                "undefined trigger mode {}",
                other
            ))),
        }
    }
}

#[derive(Default)]
struct ActivationShared {
    is_active: Cell<bool>,
    previous_state_duration: Cell<Duration>,
    current_state_duration: Cell<Duration>,
    parameter: RefCell<Option<Rc<dyn Any>>>,
}

/// Live, read-only view of an activation condition.
#[derive(Clone)]
pub struct ActivationArgs {
    shared: Rc<ActivationShared>,
}

impl fmt::Debug for ActivationArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationArgs")
            .field("is_active", &self.is_active())
            .field("previous_state_duration", &self.previous_state_duration())
            .field("current_state_duration", &self.current_state_duration())
            .field("has_parameter", &self.shared.parameter.borrow().is_some())
            .finish()
    }
}

impl ActivationArgs {
    /// Whether the condition is active right now.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.is_active.get()
    }

    /// How long the state before the most recent flip lasted.
    #[must_use]
    pub fn previous_state_duration(&self) -> Duration {
        self.shared.previous_state_duration.get()
    }

    /// Time spent in the current state.
    #[must_use]
    pub fn current_state_duration(&self) -> Duration {
        self.shared.current_state_duration.get()
    }

    /// The opaque parameter attached to the condition.
    #[must_use]
    pub fn parameter(&self) -> Option<Rc<dyn Any>> {
        self.shared.parameter.borrow().clone()
    }

    /// The parameter, if it holds a `T`.
    #[must_use]
    pub fn parameter_as<T: Any>(&self) -> Option<Rc<T>> {
        self.parameter().and_then(|p| p.downcast::<T>().ok())
    }
}

type Predicate = Box<dyn FnMut() -> bool>;

/// Activation/deactivation state machine with delays and a timeout.
pub struct ActivationCondition {
    name: String,
    listeners: EventListeners,
    predicate: Option<Predicate>,
    activation_delay: Duration,
    deactivation_delay: Duration,
    active_timeout: Duration,
    trigger_mode: TriggerMode,
    shared: Rc<ActivationShared>,
    args: EventArgs,
    last_sample: bool,
    accumulator: Duration,
    timed_out: bool,
}

impl fmt::Debug for ActivationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationCondition")
            .field("name", &self.name)
            .field("is_active", &self.is_active())
            .field("activation_delay", &self.activation_delay)
            .field("deactivation_delay", &self.deactivation_delay)
            .field("active_timeout", &self.active_timeout)
            .field("trigger_mode", &self.trigger_mode)
            .field("accumulator", &self.accumulator)
            .field("timed_out", &self.timed_out)
            .finish()
    }
}

impl ActivationCondition {
    /// Creates a condition that samples `predicate` on every [`DynamicEvent::update`].
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: FnMut() -> bool + 'static,
    {
        let mut condition = Self::manual(name);
        condition.predicate = Some(Box::new(predicate));
        condition
    }

    /// Creates a condition fed explicitly through [`ActivationCondition::update_with`].
    ///
    /// A plain `update` on a manual condition repeats the last sample.
    pub fn manual(name: impl Into<String>) -> Self {
        let shared = Rc::new(ActivationShared::default());
        Self {
            name: name.into(),
            listeners: EventListeners::new(),
            predicate: None,
            activation_delay: Duration::ZERO,
            deactivation_delay: Duration::ZERO,
            active_timeout: Duration::MAX,
            trigger_mode: TriggerMode::default(),
            args: EventArgs::Activation(ActivationArgs {
                shared: Rc::clone(&shared),
            }),
            shared,
            last_sample: false,
            accumulator: Duration::ZERO,
            timed_out: false,
        }
    }

    /// Builder form of [`ActivationCondition::set_activation_delay`].
    #[must_use]
    pub fn with_activation_delay(mut self, delay: Duration) -> Self {
        self.activation_delay = delay;
        self
    }

    /// Builder form of [`ActivationCondition::set_deactivation_delay`].
    #[must_use]
    pub fn with_deactivation_delay(mut self, delay: Duration) -> Self {
        self.deactivation_delay = delay;
        self
    }

    /// Builder form of [`ActivationCondition::set_active_timeout`].
    #[must_use]
    pub fn with_active_timeout(mut self, timeout: Duration) -> Self {
        self.active_timeout = timeout;
        self
    }

    /// Builder form of [`ActivationCondition::set_trigger_mode`].
    #[must_use]
    pub fn with_trigger_mode(mut self, mode: TriggerMode) -> Self {
        self.trigger_mode = mode;
        self
    }

    /// Builder form of [`ActivationCondition::set_parameter`].
    #[must_use]
    pub fn with_parameter(self, parameter: Rc<dyn Any>) -> Self {
        self.set_parameter(Some(parameter));
        self
    }

    /// Time the predicate must hold before activating.
    pub fn set_activation_delay(&mut self, delay: Duration) {
        self.activation_delay = delay;
    }

    /// Time the predicate must be false before deactivating.
    pub fn set_deactivation_delay(&mut self, delay: Duration) {
        self.deactivation_delay = delay;
    }

    /// Longest time the condition may stay active. `Duration::MAX` disables it.
    pub fn set_active_timeout(&mut self, timeout: Duration) {
        self.active_timeout = timeout;
    }

    /// When listeners fire.
    pub fn set_trigger_mode(&mut self, mode: TriggerMode) {
        self.trigger_mode = mode;
    }

    /// Attaches an opaque payload visible through [`ActivationArgs::parameter`].
    pub fn set_parameter(&self, parameter: Option<Rc<dyn Any>>) {
        *self.shared.parameter.borrow_mut() = parameter;
    }

    /// Replaces the predicate.
    pub fn set_predicate<F>(&mut self, predicate: F)
    where
        F: FnMut() -> bool + 'static,
    {
        self.predicate = Some(Box::new(predicate));
    }

    #[must_use]
    pub fn activation_delay(&self) -> Duration {
        self.activation_delay
    }

    #[must_use]
    pub fn deactivation_delay(&self) -> Duration {
        self.deactivation_delay
    }

    #[must_use]
    pub fn active_timeout(&self) -> Duration {
        self.active_timeout
    }

    #[must_use]
    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }

    /// Whether the condition is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.is_active.get()
    }

    /// Duration of the state before the most recent flip.
    #[must_use]
    pub fn previous_state_duration(&self) -> Duration {
        self.shared.previous_state_duration.get()
    }

    /// Time spent in the current state.
    #[must_use]
    pub fn current_state_duration(&self) -> Duration {
        self.shared.current_state_duration.get()
    }

    /// Live view handed to listeners.
    #[must_use]
    pub fn args(&self) -> ActivationArgs {
        ActivationArgs {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Advances the state machine with an explicit predicate sample.
    pub fn update_with(&mut self, sample: bool, elapsed: Duration) {
        if sample != self.last_sample {
            self.last_sample = sample;
            self.accumulator = elapsed;
            self.timed_out = false;
        } else {
            self.accumulator = self.accumulator.saturating_add(elapsed);
        }

        if !self.is_active() {
            if sample && self.accumulator >= self.activation_delay && !self.timed_out {
                self.activate();
            }
        } else {
            let released = !sample && self.accumulator >= self.deactivation_delay;
            let expired =
                !released && self.accumulator >= self.active_timeout && !self.timed_out;
            if released || expired {
                self.deactivate(expired);
            }
        }

        if self.trigger_mode == TriggerMode::WhileActive && self.is_active() {
            raise(&self.name, &self.listeners, &self.args);
        }

        let current = self.shared.current_state_duration.get();
        self.shared
            .current_state_duration
            .set(current.saturating_add(elapsed));
    }

    fn activate(&mut self) {
        self.flip_state(true, None);
        debug!("{} activated", self.name);

        if self.trigger_mode.fires_on_activation() {
            raise(&self.name, &self.listeners, &self.args);
        }
    }

    fn deactivate(&mut self, timed_out: bool) {
        let cap = timed_out.then_some(self.active_timeout);
        self.flip_state(false, cap);
        self.timed_out = timed_out;
        if timed_out {
            debug!("{} deactivated by timeout after {:?}", self.name, self.active_timeout);
        } else {
            debug!("{} deactivated", self.name);
        }

        if self.trigger_mode.fires_on_deactivation() {
            raise(&self.name, &self.listeners, &self.args);
        }
    }

    fn flip_state(&mut self, active: bool, cap: Option<Duration>) {
        let ended = self.shared.current_state_duration.get();
        let previous = match cap {
            Some(limit) => ended.min(limit),
            None => ended,
        };

        self.accumulator = Duration::ZERO;
        self.shared.previous_state_duration.set(previous);
        self.shared.current_state_duration.set(Duration::ZERO);
        self.shared.is_active.set(active);
    }
}

impl DynamicEvent for ActivationCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut EventListeners {
        &mut self.listeners
    }

    fn update(&mut self, elapsed: Duration) {
        let sample = match self.predicate.as_mut() {
            Some(predicate) => predicate(),
            None => self.last_sample,
        };
        self.update_with(sample, elapsed);
    }
}
