//! Subscription lifecycle.
//!
//! Each subscription is `Active` from [`SubscriptionManager::subscribe`]
//! until it becomes `Completed`, which happens exactly once:
//!
//! | Trigger | Effect |
//! |---------|--------|
//! | inbound `complete` | pending `subscribe` frame cancelled, `on_complete` called, listeners detached |
//! | local `complete` / `error` | pending `subscribe` frame cancelled, listeners detached |
//! | transport close | listeners detached, id finalized, no callback |
//!
//! An inbound `error` frame calls `on_error` and leaves the subscription
//! `Active`.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use futures_util::future;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::Result;
use crate::events::{Callback, Event, EventBus, EventKind, EventTarget, Handler};
use crate::identifiers::{IdGenerator, ListenerId, SubscriptionId};
use crate::protocol::{ExecutionResult, GraphQLError, Message, SubscribePayload};
use crate::transport::{Disposer, OutboundSender};

use super::{CompletionGuard, SubscriptionSink};

// ============================================================================
// Types
// ============================================================================

/// Live state of one `Active` subscription.
struct ActiveSubscription {
    listeners: [(EventKind, ListenerId); 3],
    disposer: Disposer,
}

/// Shared manager state; listeners hold it weakly.
struct Inner {
    bus: Arc<EventBus>,
    sender: Arc<OutboundSender>,
    guard: Arc<CompletionGuard>,
    ids: Box<dyn IdGenerator>,
    active: Mutex<FxHashMap<SubscriptionId, ActiveSubscription>>,
}

impl Inner {
    /// Moves `id` out of the active set, cancelling its pending frame and
    /// detaching its listeners. Returns `false` if it was not active.
    fn retire(&self, id: &SubscriptionId) -> bool {
        let Some(subscription) = self.active.lock().remove(id) else {
            return false;
        };
        self.release(subscription);
        true
    }

    fn release(&self, subscription: ActiveSubscription) {
        subscription.disposer.dispose();
        for (kind, listener) in subscription.listeners {
            self.bus.off(kind, listener);
        }
    }
}

// ============================================================================
// SubscriptionManager
// ============================================================================

/// Owns every subscription started on one client.
pub struct SubscriptionManager {
    inner: Arc<Inner>,
}

impl SubscriptionManager {
    /// Creates a manager wiring listeners on `bus` and sending through
    /// `sender`. Ids come from `ids`.
    #[must_use]
    pub fn new(
        bus: Arc<EventBus>,
        sender: Arc<OutboundSender>,
        guard: Arc<CompletionGuard>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                bus,
                sender,
                guard,
                ids,
                active: Mutex::new(FxHashMap::default()),
            }),
        }
    }

    /// Starts a subscription and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the `subscribe` frame cannot be
    /// serialized; no listener is left registered in that case.
    pub fn subscribe(
        &self,
        payload: SubscribePayload,
        sink: SubscriptionSink,
    ) -> Result<SubscriptionId> {
        let inner = &self.inner;
        let id = inner.ids.generate();

        let listeners = [
            (
                EventKind::Next,
                inner
                    .bus
                    .on(EventKind::Next, next_listener(id.clone(), sink.on_next)),
            ),
            (
                EventKind::Error,
                inner
                    .bus
                    .on(EventKind::Error, error_listener(id.clone(), sink.on_error)),
            ),
            (
                EventKind::Complete,
                inner.bus.on(
                    EventKind::Complete,
                    complete_listener(Arc::downgrade(inner), id.clone(), sink.on_complete),
                ),
            ),
        ];

        // Registered before the frame can reach the peer, so a fast reply
        // always finds the entry.
        let mut active = inner.active.lock();
        match inner.sender.subscribe(id.clone(), payload) {
            Ok(disposer) => {
                active.insert(
                    id.clone(),
                    ActiveSubscription {
                        listeners,
                        disposer,
                    },
                );
            }
            Err(e) => {
                drop(active);
                for (kind, listener) in listeners {
                    inner.bus.off(kind, listener);
                }
                return Err(e);
            }
        }

        debug!(%id, "Subscription started");
        Ok(id)
    }

    /// Ends `id` locally: cancels its `subscribe` frame if still queued and
    /// detaches its listeners. No callback is invoked.
    ///
    /// Returns `false` if `id` was not active.
    pub fn teardown(&self, id: &SubscriptionId) -> bool {
        let retired = self.inner.retire(id);
        if retired {
            debug!(%id, "Subscription ended locally");
        }
        retired
    }

    /// Completes every active subscription after the transport closed.
    ///
    /// Ids are finalized in the guard; no callback is invoked. Returns the
    /// number of subscriptions ended.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.inner.active.lock().drain().collect();
        let count = drained.len();

        for (id, subscription) in drained {
            self.inner.guard.try_finalize(&id);
            self.inner.release(subscription);
        }

        if count > 0 {
            debug!(count, "Ended subscriptions on transport close");
        }
        count
    }

    /// Returns `true` if `id` is active.
    #[inline]
    #[must_use]
    pub fn is_active(&self, id: &SubscriptionId) -> bool {
        self.inner.active.lock().contains_key(id)
    }

    /// Number of active subscriptions.
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.active.lock().len()
    }
}

// ============================================================================
// Scoped Listeners
// ============================================================================

fn next_listener(target: SubscriptionId, on_next: Option<Callback<ExecutionResult>>) -> Handler {
    Arc::new(move |event: Event| match (event, &on_next) {
        (Event::Message(Message::Next { id, payload }), Some(on_next)) if id == target => {
            on_next(payload)
        }
        _ => future::ready(()).boxed(),
    })
}

fn error_listener(
    target: SubscriptionId,
    on_error: Option<Callback<Vec<GraphQLError>>>,
) -> Handler {
    Arc::new(move |event: Event| match (event, &on_error) {
        (Event::Message(Message::Error { id, payload }), Some(on_error)) if id == target => {
            on_error(payload)
        }
        _ => future::ready(()).boxed(),
    })
}

fn complete_listener(
    inner: Weak<Inner>,
    target: SubscriptionId,
    on_complete: Option<Callback<()>>,
) -> Handler {
    Arc::new(move |event: Event| {
        let matches_target =
            matches!(&event, Event::Message(Message::Complete { id }) if *id == target);
        if !matches_target {
            return future::ready(()).boxed();
        }

        let retired = inner.upgrade().is_some_and(|inner| inner.retire(&target));
        if !retired {
            return future::ready(()).boxed();
        }

        debug!(id = %target, "Subscription completed by server");
        match &on_complete {
            Some(on_complete) => on_complete(()),
            None => future::ready(()).boxed(),
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
