//! Multi-listener event bus.
//!
//! [`EventTarget`] is the registration interface shared by the public bus
//! and the router. [`EventBus`] keeps, per [`EventKind`], an ordered list of
//! listeners; each listener is removed individually through the
//! [`ListenerId`] returned by [`EventTarget::on`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::identifiers::ListenerId;

use super::{Event, EventKind, Handler};

// ============================================================================
// EventTarget
// ============================================================================

/// Something handlers can be attached to and events emitted on.
#[async_trait]
pub trait EventTarget: Send + Sync {
    /// Registers `handler` for events of `kind`.
    fn on(&self, kind: EventKind, handler: Handler) -> ListenerId;

    /// Removes a listener. Returns `false` if it was not registered.
    ///
    /// A listener removed while an emit is in progress is not called for
    /// the rest of that emit.
    fn off(&self, kind: EventKind, listener: ListenerId) -> bool;

    /// Delivers `event` to the handlers registered for `kind`, awaiting
    /// each in turn.
    async fn emit(&self, kind: EventKind, event: Event);
}

// ============================================================================
// EventBus
// ============================================================================

/// Registered listener.
struct Listener {
    id: ListenerId,
    handler: Handler,
}

/// Ordered, removable listeners per event kind.
#[derive(Default)]
pub struct EventBus {
    /// Listeners in registration order.
    listeners: RwLock<FxHashMap<EventKind, Vec<Listener>>>,
    /// Next listener number.
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }

    /// Snapshot of the listeners for `kind`, in registration order.
    fn handlers(&self, kind: EventKind) -> Vec<(ListenerId, Handler)> {
        self.listeners
            .read()
            .get(&kind)
            .map(|list| list.iter().map(|l| (l.id, l.handler.clone())).collect())
            .unwrap_or_default()
    }

    fn is_registered(&self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners
            .read()
            .get(&kind)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }
}

#[async_trait]
impl EventTarget for EventBus {
    fn on(&self, kind: EventKind, handler: Handler) -> ListenerId {
        let id = ListenerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push(Listener { id, handler });

        trace!(%kind, %id, "Listener added");
        id
    }

    fn off(&self, kind: EventKind, listener: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };

        let before = list.len();
        list.retain(|l| l.id != listener);
        let removed = list.len() != before;

        if list.is_empty() {
            listeners.remove(&kind);
        }

        if removed {
            trace!(%kind, id = %listener, "Listener removed");
        }
        removed
    }

    async fn emit(&self, kind: EventKind, event: Event) {
        // Lock is released before any handler runs so handlers may call on/off.
        for (id, handler) in self.handlers(kind) {
            if !self.is_registered(kind, id) {
                trace!(%kind, %id, "Skipping listener removed during emit");
                continue;
            }
            handler(event.clone()).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
