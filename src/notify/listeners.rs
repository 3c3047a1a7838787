//! # Listener Sets
//!
//! Identity-deduplicated, insertion-ordered listener storage.
//!
//! Listeners are held as `Rc<F>` and compared by allocation address, so the
//! same callback registered twice is stored once, while two separately
//! allocated closures with identical code are distinct listeners.
//!
//! ```
//! use std::rc::Rc;
//! use gamepad_dynamics::notify::ListenerSet;
//!
//! let mut set: ListenerSet<dyn Fn(u32)> = ListenerSet::new();
//! let listener: Rc<dyn Fn(u32)> = Rc::new(|_| {});
//!
//! assert!(set.add(listener.clone()));
//! assert!(!set.add(listener.clone())); // already registered
//! assert!(set.contains(&listener));
//! assert!(set.remove(&listener));
//! assert!(set.is_empty());
//! ```

use std::fmt;
use std::rc::Rc;

/// Ordered set of listeners keyed by `Rc` identity.
pub struct ListenerSet<F: ?Sized> {
    entries: Vec<Rc<F>>,
}

impl<F: ?Sized> Default for ListenerSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for ListenerSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<F: ?Sized> ListenerSet<F> {
    /// Creates an empty listener set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a listener.
    ///
    /// Returns `false` if this exact listener is already registered.
    pub fn add(&mut self, listener: Rc<F>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.entries.push(listener);
        true
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove(&mut self, listener: &Rc<F>) -> bool {
        match self.entries.iter().position(|l| same_listener(l, listener)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Checks whether this exact listener is registered.
    #[must_use]
    pub fn contains(&self, listener: &Rc<F>) -> bool {
        self.entries.iter().any(|l| same_listener(l, listener))
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every listener.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates listeners in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<F>> {
        self.entries.iter()
    }

    /// Clones the current listener handles.
    ///
    /// Used when the set itself may be touched while the listeners run.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Rc<F>> {
        self.entries.clone()
    }
}

/// Compares the data address only; vtable pointers are not stable across
/// codegen units.
fn same_listener<F: ?Sized>(a: &Rc<F>, b: &Rc<F>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Callback = dyn Fn(i32);

    #[test]
    fn test_add_deduplicates_by_identity() {
        let mut set: ListenerSet<Callback> = ListenerSet::new();
        let a: Rc<Callback> = Rc::new(|_| {});

        assert!(set.add(a.clone()));
        assert!(!set.add(a.clone()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_identical_closures_are_distinct_listeners() {
        let mut set: ListenerSet<Callback> = ListenerSet::new();
        let a: Rc<Callback> = Rc::new(|_| {});
        let b: Rc<Callback> = Rc::new(|_| {});

        assert!(set.add(a));
        assert!(set.add(b));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_and_contains() {
        let mut set: ListenerSet<Callback> = ListenerSet::new();
        let a: Rc<Callback> = Rc::new(|_| {});
        let b: Rc<Callback> = Rc::new(|_| {});
        set.add(a.clone());

        assert!(set.contains(&a));
        assert!(!set.contains(&b));
        assert!(!set.remove(&b));
        assert!(set.remove(&a));
        assert!(!set.contains(&a));
        assert!(set.is_empty());
    }

    #[test]
    fn test_iteration_keeps_registration_order() {
        let order = Rc::new(Cell::new(0));
        let mut set: ListenerSet<Callback> = ListenerSet::new();

        for expected in 0..3 {
            let order = order.clone();
            set.add(Rc::new(move |_| {
                assert_eq!(order.get(), expected);
                order.set(expected + 1);
            }));
        }

        for listener in set.iter() {
            listener(0);
        }
        assert_eq!(order.get(), 3);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut set: ListenerSet<Callback> = ListenerSet::new();
        set.add(Rc::new(|_| {}));
        let snapshot = set.snapshot();
        set.clear();

        assert_eq!(snapshot.len(), 1);
        assert!(set.is_empty());
    }
}
