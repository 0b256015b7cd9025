//! Inbound frame routing.
//!
//! The router decodes each raw frame and delivers the resulting event to two
//! independent sinks, in order:
//!
//! 1. the single-slot handler for the event kind (assignment replaces),
//! 2. the multi-listener [`EventBus`].
//!
//! Frames for subscriptions that already reached a terminal state are
//! dropped before either sink sees them.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace, warn};

use crate::identifiers::ListenerId;
use crate::protocol::{Message, decode};
use crate::subscription::CompletionGuard;

use super::{Event, EventBus, EventKind, EventTarget, Handler};

// ============================================================================
// EventRouter
// ============================================================================

/// Decodes inbound frames and dispatches typed events.
pub struct EventRouter {
    /// Single-slot handlers, at most one per kind.
    slots: RwLock<FxHashMap<EventKind, Handler>>,
    /// Multi-listener bus.
    bus: Arc<EventBus>,
    /// Terminal-state guard shared with the outbound path.
    guard: Arc<CompletionGuard>,
    /// Held for the whole processing of one inbound frame.
    gate: AsyncMutex<()>,
}

impl EventRouter {
    /// Creates a router over `bus`, consulting `guard` for terminal state.
    #[must_use]
    pub fn new(bus: Arc<EventBus>, guard: Arc<CompletionGuard>) -> Self {
        Self {
            slots: RwLock::new(FxHashMap::default()),
            bus,
            guard,
            gate: AsyncMutex::new(()),
        }
    }

    /// Returns the bus this router delivers to.
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Sets or clears the single-slot handler for `kind`.
    ///
    /// Returns the handler that was replaced, if any.
    pub fn set_handler(&self, kind: EventKind, handler: Option<Handler>) -> Option<Handler> {
        let mut slots = self.slots.write();
        match handler {
            Some(handler) => slots.insert(kind, handler),
            None => slots.remove(&kind),
        }
    }

    /// Returns `true` if a single-slot handler is set for `kind`.
    #[must_use]
    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.slots.read().contains_key(&kind)
    }

    /// Processes one raw inbound frame.
    ///
    /// Resolves once every handler for the frame has completed. Concurrent
    /// calls are processed one after another.
    pub async fn receive(&self, raw: &str) {
        let _gate = self.gate.lock().await;

        let event = match decode(raw) {
            Ok(message) => {
                if !self.admit(&message) {
                    return;
                }
                Event::Message(message)
            }
            Err(e) => {
                warn!(reason = e.reason(), "Undecodable frame");
                Event::Unknown(e)
            }
        };

        self.dispatch(event).await;
    }

    /// Applies the completion guard to an inbound message.
    fn admit(&self, message: &Message) -> bool {
        match message {
            Message::Next { id, .. } | Message::Error { id, .. } if self.guard.contains(id) => {
                trace!(%id, kind = message.type_name(), "Dropped frame for finalized subscription");
                false
            }
            Message::Complete { id } if !self.guard.try_finalize(id) => {
                trace!(%id, "Dropped duplicate complete");
                false
            }
            _ => true,
        }
    }

    /// Delivers an event to the slot handler, then to the bus.
    async fn dispatch(&self, event: Event) {
        let kind = event.kind();
        let slot = self.slots.read().get(&kind).cloned();

        if slot.is_none() && self.bus.listener_count(kind) == 0 {
            debug!(%kind, "No handler registered");
            return;
        }

        if let Some(handler) = slot {
            handler(event.clone()).await;
        }
        self.bus.emit(kind, event).await;
    }
}

#[async_trait]
impl EventTarget for EventRouter {
    fn on(&self, kind: EventKind, handler: Handler) -> ListenerId {
        self.bus.on(kind, handler)
    }

    fn off(&self, kind: EventKind, listener: ListenerId) -> bool {
        self.bus.off(kind, listener)
    }

    async fn emit(&self, kind: EventKind, event: Event) {
        debug_assert_eq!(kind, event.kind());
        self.dispatch(event).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
