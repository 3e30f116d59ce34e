//! The controller's single-threaded event queue.
//!
//! Every asynchronous arrival (registry invalidation, state setter invoked
//! from inside execution, cache epoch advance, host setter calls) becomes an
//! event. Callbacks hold a clonable [`EventQueue`] handle and only push; the
//! controller drains on its own thread. This is what guarantees the
//! happens-before ordering between identity recomputation and input assembly
//! without explicit locks around controller state.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use widget_types::{
    ConfigOverride, ExecutionContext, InstanceVersion, StateSlot, WidgetReference,
};

/// One unit of controller work.
#[derive(Debug)]
pub enum Event {
    /// The caller's reference or configuration list changed.
    SetReference {
        reference: WidgetReference,
        configs: Vec<ConfigOverride>,
    },
    /// Caller-provided properties changed.
    SetProps(Value),
    /// Ambient context changed (login, network switch).
    SetContext(ExecutionContext),
    /// The registry signalled that the tracked code changed.
    SourceInvalidated,
    /// The network's cache epoch advanced to this value.
    CacheEpochAdvanced(u64),
    /// Sandboxed code replaced its state slot. Dropped unless `instance` is
    /// still the live instance.
    StateUpdated {
        instance: InstanceVersion,
        slot: StateSlot,
    },
    /// Sandboxed code requested a cache refresh for its own scope.
    RefreshCache,
}

/// Clonable handle to the controller's event queue.
#[derive(Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<Event>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.inner.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<Event> {
        self.inner.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}
