//! # Notification Queue
//!
//! Per-entity dispatch queue for zero-argument actions.
//!
//! In [`DispatchMode::Immediate`] an action runs the moment it is raised.
//! In [`DispatchMode::Deferred`] it is appended to the queue and runs when the
//! owning entity calls [`NotificationQueue::dispatch_all`] at the end of its
//! own update.
//!
//! Cloning a queue yields another handle to the same queue, so a listener can
//! capture a handle and raise follow-up actions while the queue is being
//! drained. Those actions run before `dispatch_all` returns.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::EngineError;

/// A queued notification action.
pub type Action = Box<dyn FnOnce()>;

/// When raised actions are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Run every action synchronously inside the call that raised it.
    Immediate,
    /// Queue actions until the owner drains them.
    #[default]
    Deferred,
}

impl FromStr for DispatchMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(DispatchMode::Immediate),
            "deferred" => Ok(DispatchMode::Deferred),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown dispatch mode '{}'",
                other
            ))),
        }
    }
}

struct QueueInner {
    mode: Cell<DispatchMode>,
    pending: RefCell<VecDeque<Action>>,
    dispatching: Cell<bool>,
}

/// Shared handle to one entity's notification queue.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Rc<QueueInner>,
}

impl fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("mode", &self.inner.mode.get())
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DispatchMode::default())
    }
}

impl NotificationQueue {
    /// Creates an empty queue in the given mode.
    #[must_use]
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            inner: Rc::new(QueueInner {
                mode: Cell::new(mode),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    /// Current dispatch mode.
    #[must_use]
    pub fn mode(&self) -> DispatchMode {
        self.inner.mode.get()
    }

    /// Switches the dispatch mode.
    ///
    /// Switching to `Immediate` drains anything still pending so the queue
    /// stays empty in immediate mode.
    pub fn set_mode(&self, mode: DispatchMode) {
        self.inner.mode.set(mode);
        if mode == DispatchMode::Immediate {
            self.dispatch_all();
        }
    }

    /// Runs `action` now (immediate mode) or queues it (deferred mode).
    pub fn raise_deferred<A>(&self, action: A)
    where
        A: FnOnce() + 'static,
    {
        match self.mode() {
            DispatchMode::Immediate => action(),
            DispatchMode::Deferred => self.inner.pending.borrow_mut().push_back(Box::new(action)),
        }
    }

    /// Runs queued actions in FIFO order until the queue is empty.
    ///
    /// The queue length is re-checked after every action, so actions raised by
    /// a listener during dispatch run in the same call. A nested call made from
    /// inside an action returns immediately; the outer loop picks up the work.
    ///
    /// Returns the number of actions executed.
    pub fn dispatch_all(&self) -> usize {
        if self.inner.dispatching.replace(true) {
            return 0;
        }

        let mut executed = 0;
        loop {
            // Borrow ends before the action runs.
            let next = self.inner.pending.borrow_mut().pop_front();
            match next {
                Some(action) => {
                    action();
                    executed += 1;
                }
                None => break,
            }
        }

        self.inner.dispatching.set(false);
        executed
    }

    /// Discards queued actions without running them.
    ///
    /// Returns the number of actions dropped.
    pub fn clear_queued(&self) -> usize {
        let mut pending = self.inner.pending.borrow_mut();
        let dropped = pending.len();
        pending.clear();
        dropped
    }

    /// Number of actions waiting to run.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }
}
