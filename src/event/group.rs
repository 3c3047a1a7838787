//! # Event Groups
//!
//! Aggregates child events into one stream.
//!
//! A group forwards every tick to its children in insertion order and
//! re-raises each child trigger to the group's own listeners, keeping the
//! child's name as the source. Groups are events themselves, so they nest.
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//! use gamepad_dynamics::event::{
//!     ButtonEdgeEvent, DigitalButtonState, DynamicEvent, EventArgs, EventGroup,
//! };
//!
//! let (button, driver) = DigitalButtonState::driven();
//! let mut group = EventGroup::new("pad");
//! group.add(Box::new(ButtonEdgeEvent::press("south.press", button)));
//! group.add_listener(Rc::new(|source: &str, _: &EventArgs| println!("{} fired", source)));
//!
//! driver.update(true, Duration::from_millis(16));
//! group.update(Duration::from_millis(16)); // prints "south.press fired"
//! ```

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::time::Duration;

use super::{raise, DynamicEvent, EventArgs, EventListener, EventListeners};

type Forwarded = Rc<RefCell<Vec<(String, EventArgs)>>>;

/// Composite event that ticks its children and re-raises their triggers.
pub struct EventGroup {
    name: String,
    listeners: EventListeners,
    children: Vec<Box<dyn DynamicEvent>>,
    forwarded: Forwarded,
    forwarder: EventListener,
}

impl fmt::Debug for EventGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventGroup")
            .field("name", &self.name)
            .field("children", &self.children.iter().map(|c| c.name()).collect::<Vec<_>>())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl EventGroup {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        let forwarded: Forwarded = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&forwarded);
        let forwarder: EventListener = Rc::new(move |source: &str, args: &EventArgs| {
            sink.borrow_mut().push((source.to_string(), args.clone()));
        });

        Self {
            name: name.into(),
            listeners: EventListeners::new(),
            children: Vec::new(),
            forwarded,
            forwarder,
        }
    }

    /// Adds a child event. Returns the child's index.
    pub fn add(&mut self, mut child: Box<dyn DynamicEvent>) -> usize {
        child.add_listener(Rc::clone(&self.forwarder));
        self.children.push(child);
        self.children.len() - 1
    }

    /// Removes the first child with the given name and hands it back.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn DynamicEvent>> {
        let index = self.children.iter().position(|c| c.name() == name)?;
        let mut child = self.children.remove(index);
        child.remove_listener(&self.forwarder);
        Some(child)
    }

    /// Looks up a child by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn DynamicEvent> {
        self.children
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// Looks up a child by name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn DynamicEvent + 'static)> {
        self.children
            .iter_mut()
            .find(|c| c.name() == name)
            .map(|c| c.as_mut())
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the group has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Names of the direct children, in tick order.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.name())
    }
}

impl DynamicEvent for EventGroup {
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
        for child in &mut self.children {
            child.update(elapsed);

            let fired = mem::take(&mut *self.forwarded.borrow_mut());
            for (source, args) in fired {
                raise(&source, &self.listeners, &args);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::testing::recorder;
    use crate::event::{ButtonEdgeEvent, DigitalButtonState, HoldEvent};

    const TICK: Duration = Duration::from_millis(10);

    #[test]
    fn test_group_forwards_child_triggers() {
        let (button, driver) = DigitalButtonState::driven();
        let mut group = EventGroup::new("pad");
        group.add(Box::new(ButtonEdgeEvent::press("a.press", button.clone())));
        group.add(Box::new(ButtonEdgeEvent::release("a.release", button)));
        let (log, listener) = recorder();
        group.add_listener(listener);

        driver.update(true, TICK);
        group.update(TICK);
        driver.update(false, TICK);
        group.update(TICK);

        let sources: Vec<_> = log.borrow().iter().map(|f| f.source.clone()).collect();
        assert_eq!(sources, vec!["a.press", "a.release"]);
    }

    #[test]
    fn test_child_listeners_still_fire() {
        let (button, driver) = DigitalButtonState::driven();
        let mut press = ButtonEdgeEvent::press("a.press", button);
        let (child_log, child_listener) = recorder();
        press.add_listener(child_listener);

        let mut group = EventGroup::new("pad");
        group.add(Box::new(press));

        driver.update(true, TICK);
        group.update(TICK);

        assert_eq!(child_log.borrow().len(), 1);
    }

    #[test]
    fn test_nested_groups_propagate() {
        let (button, driver) = DigitalButtonState::driven();
        let mut inner = EventGroup::new("inner");
        inner.add(Box::new(HoldEvent::new("a.hold", button, Duration::from_millis(20))));

        let mut outer = EventGroup::new("outer");
        outer.add(Box::new(inner));
        let (log, listener) = recorder();
        outer.add_listener(listener);

        for _ in 0..4 {
            driver.update(true, TICK);
            outer.update(TICK);
        }

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].source, "a.hold");
    }

    #[test]
    fn test_remove_detaches_child() {
        let (button, driver) = DigitalButtonState::driven();
        let mut group = EventGroup::new("pad");
        group.add(Box::new(ButtonEdgeEvent::press("a.press", button)));
        let (log, listener) = recorder();
        group.add_listener(listener);

        let mut removed = group.remove("a.press").expect("child exists");
        assert!(group.is_empty());

        driver.update(true, TICK);
        removed.update(TICK);
        group.update(TICK);

        assert!(log.borrow().is_empty());
        assert!(group.remove("a.press").is_none());
    }

    #[test]
    fn test_lookup_by_name() {
        let (button, _) = DigitalButtonState::driven();
        let mut group = EventGroup::new("pad");
        group.add(Box::new(ButtonEdgeEvent::press("a.press", button.clone())));
        group.add(Box::new(ButtonEdgeEvent::release("a.release", button)));

        assert_eq!(group.len(), 2);
        assert!(group.get("a.release").is_some());
        assert!(group.get_mut("a.press").is_some());
        assert!(group.get("b.press").is_none());
        assert_eq!(group.child_names().collect::<Vec<_>>(), vec!["a.press", "a.release"]);
    }
}
