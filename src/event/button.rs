//! # Digital Buttons
//!
//! Button state holders and the events derived from them.
//!
//! A [`DigitalButtonState`] is a read handle. It is either driven by exactly
//! one [`ButtonDriver`] held by the owner (the gamepad, or a test) or a fixed,
//! immutable snapshot. Events keep a read handle and sample it every tick.
//!
//! ## Events
//!
//! - [`ButtonEdgeEvent`]: fires once on the press or release edge
//! - [`HoldEvent`]: fires once when a continuous press reaches a duration
//!
//! ```
//! use std::time::Duration;
//! use gamepad_dynamics::event::DigitalButtonState;
//!
//! let (button, driver) = DigitalButtonState::driven();
//! driver.update(true, Duration::from_millis(10));
//! driver.update(true, Duration::from_millis(10));
//!
//! assert!(button.is_pressed());
//! assert_eq!(button.duration_in_state(), Duration::from_millis(10));
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::{raise, DynamicEvent, EventArgs, EventListeners};

/// Button state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSnapshot {
    /// Whether the button is held down.
    pub is_pressed: bool,
    /// Time spent in the current state. Restarts at zero on every flip.
    pub duration_in_state: Duration,
}

/// Read handle on a digital button.
#[derive(Clone)]
pub struct DigitalButtonState {
    cell: Rc<Cell<ButtonSnapshot>>,
}

impl fmt::Debug for DigitalButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.cell.get();
        f.debug_struct("DigitalButtonState")
            .field("is_pressed", &snapshot.is_pressed)
            .field("duration_in_state", &snapshot.duration_in_state)
            .finish()
    }
}

impl DigitalButtonState {
    /// Creates a released button plus the driver that updates it.
    #[must_use]
    pub fn driven() -> (Self, ButtonDriver) {
        let cell = Rc::new(Cell::new(ButtonSnapshot::default()));
        (
            Self {
                cell: Rc::clone(&cell),
            },
            ButtonDriver { cell },
        )
    }

    /// Creates an immutable button state.
    #[must_use]
    pub fn fixed(is_pressed: bool, duration_in_state: Duration) -> Self {
        Self {
            cell: Rc::new(Cell::new(ButtonSnapshot {
                is_pressed,
                duration_in_state,
            })),
        }
    }

    /// Whether the button is currently held down.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.cell.get().is_pressed
    }

    /// Time since the last press/release flip.
    #[must_use]
    pub fn duration_in_state(&self) -> Duration {
        self.cell.get().duration_in_state
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> ButtonSnapshot {
        self.cell.get()
    }
}

/// Write side of a driven button. Owned by whoever samples the hardware.
#[derive(Debug)]
pub struct ButtonDriver {
    cell: Rc<Cell<ButtonSnapshot>>,
}

impl ButtonDriver {
    /// Feeds one tick of button input.
    ///
    /// Returns `true` if the pressed state flipped.
    pub fn update(&self, is_pressed: bool, elapsed: Duration) -> bool {
        let current = self.cell.get();
        if current.is_pressed != is_pressed {
            self.cell.set(ButtonSnapshot {
                is_pressed,
                duration_in_state: Duration::ZERO,
            });
            return true;
        }

        self.cell.set(ButtonSnapshot {
            is_pressed,
            duration_in_state: current.duration_in_state.saturating_add(elapsed),
        });
        false
    }

    /// Returns the button to released with zero duration.
    pub fn reset(&self) {
        self.cell.set(ButtonSnapshot::default());
    }

    /// A new read handle on the driven button.
    #[must_use]
    pub fn state(&self) -> DigitalButtonState {
        DigitalButtonState {
            cell: Rc::clone(&self.cell),
        }
    }
}

/// Which edge a [`ButtonEdgeEvent`] reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Released -> pressed.
    Press,
    /// Pressed -> released.
    Release,
}

/// Fires once per press or release edge.
pub struct ButtonEdgeEvent {
    name: String,
    listeners: EventListeners,
    button: DigitalButtonState,
    edge: Edge,
    fired: bool,
    args: EventArgs,
}

impl fmt::Debug for ButtonEdgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonEdgeEvent")
            .field("name", &self.name)
            .field("edge", &self.edge)
            .field("fired", &self.fired)
            .finish()
    }
}

impl ButtonEdgeEvent {
    /// Creates an event for the given edge.
    pub fn new(name: impl Into<String>, button: DigitalButtonState, edge: Edge) -> Self {
        Self {
            name: name.into(),
            listeners: EventListeners::new(),
            args: EventArgs::Button(button.clone()),
            button,
            edge,
            // A button that starts released has not produced a release edge.
            fired: edge == Edge::Release,
        }
    }

    /// Fires when the button goes down.
    pub fn press(name: impl Into<String>, button: DigitalButtonState) -> Self {
        Self::new(name, button, Edge::Press)
    }

    /// Fires when the button comes back up.
    pub fn release(name: impl Into<String>, button: DigitalButtonState) -> Self {
        Self::new(name, button, Edge::Release)
    }

    /// The edge this event reacts to.
    #[must_use]
    pub fn edge(&self) -> Edge {
        self.edge
    }
}

impl DynamicEvent for ButtonEdgeEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut EventListeners {
        &mut self.listeners
    }

    fn update(&mut self, _elapsed: Duration) {
        let pressed = self.button.is_pressed();
        let on_edge_side = match self.edge {
            Edge::Press => pressed,
            Edge::Release => !pressed,
        };

        if !on_edge_side {
            self.fired = false;
            return;
        }
        if !self.fired {
            self.fired = true;
            raise(&self.name, &self.listeners, &self.args);
        }
    }
}

/// Fires once when a continuous press reaches `hold_duration`.
pub struct HoldEvent {
    name: String,
    listeners: EventListeners,
    button: DigitalButtonState,
    hold_duration: Duration,
    fired: bool,
    args: EventArgs,
}

impl fmt::Debug for HoldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoldEvent")
            .field("name", &self.name)
            .field("hold_duration", &self.hold_duration)
            .field("fired", &self.fired)
            .finish()
    }
}

impl HoldEvent {
    /// Creates a hold event.
    pub fn new(name: impl Into<String>, button: DigitalButtonState, hold_duration: Duration) -> Self {
        Self {
            name: name.into(),
            listeners: EventListeners::new(),
            args: EventArgs::Button(button.clone()),
            button,
            hold_duration,
            fired: false,
        }
    }

    /// Press duration required before firing.
    #[must_use]
    pub fn hold_duration(&self) -> Duration {
        self.hold_duration
    }

    /// Changes the required press duration. Takes effect on the next tick.
    pub fn set_hold_duration(&mut self, hold_duration: Duration) {
        self.hold_duration = hold_duration;
    }
}

impl DynamicEvent for HoldEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut EventListeners {
        &mut self.listeners
    }

    fn update(&mut self, _elapsed: Duration) {
        let snapshot = self.button.snapshot();
        if !snapshot.is_pressed {
            self.fired = false;
            return;
        }
        if !self.fired && snapshot.duration_in_state >= self.hold_duration {
            self.fired = true;
            raise(&self.name, &self.listeners, &self.args);
        }
    }
}
