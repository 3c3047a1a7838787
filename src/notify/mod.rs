//! # Notification Module
//!
//! Change-notification plumbing shared by every stateful entity.
//!
//! This module handles:
//! - Identity-deduplicated listener sets ([`ListenerSet`])
//! - Immediate or deferred action dispatch ([`NotificationQueue`])
//! - The "set field, notify if changed" helper ([`Notifier::set_property`])
//!
//! ## Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use gamepad_dynamics::notify::{DispatchMode, Notifier};
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Prop { Level }
//!
//! let notifier = Notifier::new(DispatchMode::Deferred);
//! let seen = Rc::new(Cell::new(0));
//! let counter = seen.clone();
//! notifier.subscribe(Rc::new(move |_: Prop| counter.set(counter.get() + 1)));
//!
//! let mut level = 0;
//! assert!(notifier.set_property(&mut level, 3, Prop::Level));
//! assert!(!notifier.set_property(&mut level, 3, Prop::Level)); // unchanged
//! assert_eq!(seen.get(), 0); // still queued
//!
//! notifier.dispatch_all();
//! assert_eq!(seen.get(), 1);
//! ```

pub mod listeners;
pub mod queue;

pub use listeners::ListenerSet;
pub use queue::{Action, DispatchMode, NotificationQueue};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Callback receiving the property that changed.
pub type PropertyListener<P> = Rc<dyn Fn(P)>;

/// Property-change notifier owned by one entity.
///
/// `P` is the entity's property enum. Listeners are looked up when a
/// notification is dispatched, not when it is raised.
pub struct Notifier<P: Copy + 'static> {
    queue: NotificationQueue,
    listeners: Rc<RefCell<ListenerSet<dyn Fn(P)>>>,
}

impl<P: Copy + 'static> fmt::Debug for Notifier<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("queue", &self.queue)
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl<P: Copy + 'static> Default for Notifier<P> {
    fn default() -> Self {
        Self::new(DispatchMode::default())
    }
}

impl<P: Copy + 'static> Notifier<P> {
    /// Creates a notifier with its own queue.
    #[must_use]
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            queue: NotificationQueue::new(mode),
            listeners: Rc::new(RefCell::new(ListenerSet::new())),
        }
    }

    /// The underlying queue.
    #[must_use]
    pub fn queue(&self) -> &NotificationQueue {
        &self.queue
    }

    /// Registers a property listener. Returns `false` if already registered.
    pub fn subscribe(&self, listener: PropertyListener<P>) -> bool {
        self.listeners.borrow_mut().add(listener)
    }

    /// Unregisters a property listener.
    pub fn unsubscribe(&self, listener: &PropertyListener<P>) -> bool {
        self.listeners.borrow_mut().remove(listener)
    }

    /// Checks whether a listener is registered.
    #[must_use]
    pub fn is_subscribed(&self, listener: &PropertyListener<P>) -> bool {
        self.listeners.borrow().contains(listener)
    }

    /// Stores `value` into `field` and raises a change notification for
    /// `property` if the value differs.
    ///
    /// Returns whether the field changed.
    pub fn set_property<T: PartialEq>(&self, field: &mut T, value: T, property: P) -> bool {
        if *field == value {
            return false;
        }
        *field = value;
        self.notify(property);
        true
    }

    /// Raises a change notification for `property` unconditionally.
    pub fn notify(&self, property: P) {
        let listeners = Rc::clone(&self.listeners);
        self.queue.raise_deferred(move || {
            let current = listeners.borrow().snapshot();
            for listener in current {
                listener(property);
            }
        });
    }

    /// Drains pending notifications. See [`NotificationQueue::dispatch_all`].
    pub fn dispatch_all(&self) -> usize {
        self.queue.dispatch_all()
    }

    /// Drops pending notifications. See [`NotificationQueue::clear_queued`].
    pub fn clear_queued(&self) -> usize {
        self.queue.clear_queued()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Prop {
        A,
        B,
    }

    fn recording_listener(log: &Rc<RefCell<Vec<Prop>>>) -> PropertyListener<Prop> {
        let log = log.clone();
        Rc::new(move |p| log.borrow_mut().push(p))
    }

    #[test]
    fn test_set_property_reports_change() {
        let notifier: Notifier<Prop> = Notifier::new(DispatchMode::Immediate);
        let log = Rc::new(RefCell::new(Vec::new()));
        notifier.subscribe(recording_listener(&log));

        let mut field = 1.0_f32;
        assert!(notifier.set_property(&mut field, 2.0, Prop::A));
        assert_eq!(field, 2.0);
        assert!(!notifier.set_property(&mut field, 2.0, Prop::A));

        assert_eq!(*log.borrow(), vec![Prop::A]);
    }

    #[test]
    fn test_deferred_notifications_keep_order() {
        let notifier: Notifier<Prop> = Notifier::new(DispatchMode::Deferred);
        let log = Rc::new(RefCell::new(Vec::new()));
        notifier.subscribe(recording_listener(&log));

        let mut a = 0;
        let mut b = 0;
        notifier.set_property(&mut b, 1, Prop::B);
        notifier.set_property(&mut a, 1, Prop::A);
        assert!(log.borrow().is_empty());

        assert_eq!(notifier.dispatch_all(), 2);
        assert_eq!(*log.borrow(), vec![Prop::B, Prop::A]);
    }

    #[test]
    fn test_listener_registered_before_dispatch_sees_queued_change() {
        let notifier: Notifier<Prop> = Notifier::new(DispatchMode::Deferred);
        let log = Rc::new(RefCell::new(Vec::new()));

        notifier.notify(Prop::A);
        notifier.subscribe(recording_listener(&log));
        notifier.dispatch_all();

        assert_eq!(*log.borrow(), vec![Prop::A]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier: Notifier<Prop> = Notifier::new(DispatchMode::Immediate);
        let log = Rc::new(RefCell::new(Vec::new()));
        let listener = recording_listener(&log);
        notifier.subscribe(listener.clone());
        assert!(notifier.is_subscribed(&listener));

        assert!(notifier.unsubscribe(&listener));
        notifier.notify(Prop::B);

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_clear_queued_discards_notifications() {
        let notifier: Notifier<Prop> = Notifier::new(DispatchMode::Deferred);
        let log = Rc::new(RefCell::new(Vec::new()));
        notifier.subscribe(recording_listener(&log));

        notifier.notify(Prop::A);
        assert_eq!(notifier.clear_queued(), 1);
        notifier.dispatch_all();

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_listener_can_subscribe_during_dispatch() {
        let notifier: Rc<Notifier<Prop>> = Rc::new(Notifier::new(DispatchMode::Deferred));
        let log = Rc::new(RefCell::new(Vec::new()));
        let late = recording_listener(&log);

        let handle = Rc::downgrade(&notifier);
        notifier.subscribe(Rc::new(move |_| {
            if let Some(n) = handle.upgrade() {
                n.subscribe(late.clone());
            }
        }));

        notifier.notify(Prop::A);
        notifier.notify(Prop::B);
        notifier.dispatch_all();

        // The late listener joins while A is dispatched and sees B.
        assert_eq!(*log.borrow(), vec![Prop::B]);
    }
}
