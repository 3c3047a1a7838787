//! # Dynamic Event Module
//!
//! Conditions re-evaluated every tick that fire listener callbacks according
//! to timing rules.
//!
//! This module handles:
//! - The [`DynamicEvent`] contract shared by every condition
//! - Hierarchical aggregation with [`EventGroup`]
//! - The generic activation/deactivation state machine ([`ActivationCondition`])
//! - Digital button edges and holds ([`ButtonEdgeEvent`], [`HoldEvent`])
//! - Accelerating auto-repeat ([`RepeatEvent`])
//!
//! Listeners receive `(source, args)`: the name of the event that fired and
//! its [`EventArgs`]. A group re-raises its children's triggers with the
//! child's name as the source.

pub mod activation;
pub mod button;
pub mod group;
pub mod repeat;

pub use activation::{ActivationArgs, ActivationCondition, TriggerMode};
pub use button::{ButtonDriver, ButtonEdgeEvent, ButtonSnapshot, DigitalButtonState, Edge, HoldEvent};
pub use group::EventGroup;
pub use repeat::{RepeatArgs, RepeatEvent, RepeatSettings};

use std::rc::Rc;
use std::time::Duration;

use crate::axis::math::elapsed_from_secs;
use crate::error::Result;
use crate::notify::ListenerSet;

/// Callback invoked when an event fires: `(source name, args)`.
pub type EventListener = Rc<dyn Fn(&str, &EventArgs)>;

/// Listener storage used by every dynamic event.
pub type EventListeners = ListenerSet<dyn Fn(&str, &EventArgs)>;

/// Payload handed to event listeners.
#[derive(Debug, Clone)]
pub enum EventArgs {
    /// No payload.
    None,
    /// Live view of an activation condition. Reads always return the
    /// condition's current state, not the state at fire time.
    Activation(ActivationArgs),
    /// Read handle on the button that fired.
    Button(DigitalButtonState),
    /// Repeat progress captured when the repeat fired.
    Repeat(RepeatArgs),
}

impl EventArgs {
    /// Returns the activation view, if this is an activation payload.
    #[must_use]
    pub fn as_activation(&self) -> Option<&ActivationArgs> {
        match self {
            EventArgs::Activation(args) => Some(args),
            _ => None,
        }
    }

    /// Returns the button handle for button and repeat payloads.
    #[must_use]
    pub fn as_button(&self) -> Option<&DigitalButtonState> {
        match self {
            EventArgs::Button(button) => Some(button),
            EventArgs::Repeat(args) => Some(&args.button),
            _ => None,
        }
    }

    /// Returns the repeat payload, if any.
    #[must_use]
    pub fn as_repeat(&self) -> Option<&RepeatArgs> {
        match self {
            EventArgs::Repeat(args) => Some(args),
            _ => None,
        }
    }
}

/// A condition evaluated once per tick.
///
/// Implementors evaluate their condition in [`DynamicEvent::update`] and call
/// [`raise`] zero, one or several times per tick.
pub trait DynamicEvent {
    /// Name passed to listeners as the event source.
    fn name(&self) -> &str;

    /// Registered listeners.
    fn listeners(&self) -> &EventListeners;

    /// Registered listeners, mutably.
    fn listeners_mut(&mut self) -> &mut EventListeners;

    /// Advances the condition by `elapsed` and fires listeners as needed.
    fn update(&mut self, elapsed: Duration);

    /// Advances the condition by a float number of seconds.
    ///
    /// Negative values are clamped to zero; NaN is rejected before any state
    /// changes.
    fn update_secs(&mut self, secs: f64) -> Result<()> {
        let elapsed = elapsed_from_secs(secs)?;
        self.update(elapsed);
        Ok(())
    }

    /// Registers a listener. Returns `false` if it was already registered.
    fn add_listener(&mut self, listener: EventListener) -> bool {
        self.listeners_mut().add(listener)
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    fn remove_listener(&mut self, listener: &EventListener) -> bool {
        self.listeners_mut().remove(listener)
    }

    /// Checks whether a listener is registered.
    fn has_listener(&self, listener: &EventListener) -> bool {
        self.listeners().contains(listener)
    }
}

/// Invokes every listener synchronously with the same args.
pub fn raise(source: &str, listeners: &EventListeners, args: &EventArgs) {
    for listener in listeners.iter() {
        listener(source, args);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers shared by the event tests.

    use super::*;
    use std::cell::RefCell;

    /// One recorded listener call.
    #[derive(Debug, Clone)]
    pub struct Fired {
        pub source: String,
        pub args: EventArgs,
    }

    /// Listener appending every call to a shared log.
    pub fn recorder() -> (Rc<RefCell<Vec<Fired>>>, EventListener) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let listener: EventListener = Rc::new(move |source: &str, args: &EventArgs| {
            sink.borrow_mut().push(Fired {
                source: source.to_string(),
                args: args.clone(),
            });
        });
        (log, listener)
    }
}
