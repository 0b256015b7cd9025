//! Client facade.
//!
//! [`Client`] owns one protocol session: the outbound sender, the event
//! router, the completion guard and the subscription manager. It is cheap to
//! clone; clones share the session.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tracing::{debug, trace};

use crate::error::Result;
use crate::events::{EventBus, EventKind, EventRouter, EventTarget, Handler};
use crate::identifiers::{IdGenerator, ListenerId, SubscriptionId};
use crate::protocol::{ExecutionResult, GraphQLError, Payload, SubscribePayload};
use crate::subscription::{CompletionGuard, SubscriptionManager, SubscriptionSink};
use crate::transport::{OutboundSender, ReadyState};

use super::builder::ClientBuilder;

// ============================================================================
// Client
// ============================================================================

/// Shared session state.
struct ClientInner {
    sender: Arc<OutboundSender>,
    router: EventRouter,
    guard: Arc<CompletionGuard>,
    subscriptions: SubscriptionManager,
    /// Wakes the transport writer on close.
    shutdown: Arc<Notify>,
}

/// A graphql-transport-ws client session.
///
/// # Example
///
/// ```no_run
/// use graphql_ws_client::{Client, SubscribePayload, SubscriptionSink};
///
/// # async fn example() -> graphql_ws_client::Result<()> {
/// let client = Client::builder().url("ws://localhost:4000/graphql").connect()?;
/// client.connection_init(None)?;
///
/// let id = client.subscribe(
///     SubscribePayload::new("subscription { tick }"),
///     SubscriptionSink::new().on_next(|result| async move {
///         println!("{:?}", result.data);
///     }),
/// )?;
///
/// client.complete(&id)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client {
    /// Creates a builder for a WebSocket-backed client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client whose serialized frames are written to `sink`.
    ///
    /// For callers bringing their own transport: drive the client with
    /// [`Client::mark_open`], [`Client::receive`] and
    /// [`Client::handle_close`].
    #[must_use]
    pub fn from_channel(sink: mpsc::UnboundedSender<String>, ids: Box<dyn IdGenerator>) -> Self {
        let bus = Arc::new(EventBus::new());
        let guard = Arc::new(CompletionGuard::new());
        let sender = Arc::new(OutboundSender::new(sink));
        let router = EventRouter::new(Arc::clone(&bus), Arc::clone(&guard));
        let subscriptions =
            SubscriptionManager::new(bus, Arc::clone(&sender), Arc::clone(&guard), ids);

        Self {
            inner: Arc::new(ClientInner {
                sender,
                router,
                guard,
                subscriptions,
                shutdown: Arc::new(Notify::new()),
            }),
        }
    }
}

// ============================================================================
// Client - Transport Hooks
// ============================================================================

impl Client {
    /// Marks the transport ready and flushes queued frames.
    pub fn mark_open(&self) {
        self.inner.sender.mark_open();
    }

    /// Processes one raw inbound frame, resolving once every handler for it
    /// has completed.
    pub async fn receive(&self, raw: &str) {
        self.inner.router.receive(raw).await;
    }

    /// Handles transport close: further sends are discarded and every active
    /// subscription ends without a callback.
    pub fn handle_close(&self) {
        self.inner.sender.mark_closed();
        self.inner.subscriptions.close_all();
        self.inner.shutdown.notify_one();
    }

    /// Requests the transport to close.
    pub fn close(&self) {
        debug!(state = %self.ready_state(), "Close requested");
        self.inner.sender.mark_closing();
        self.inner.shutdown.notify_one();
    }

    pub(crate) fn shutdown_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.inner.shutdown)
    }
}

// ============================================================================
// Client - Sending
// ============================================================================

impl Client {
    /// Sends `connection_init`.
    pub fn connection_init(&self, payload: Option<Payload>) -> Result<()> {
        self.inner.sender.connection_init(payload)
    }

    /// Sends `ping`.
    pub fn ping(&self, payload: Option<Payload>) -> Result<()> {
        self.inner.sender.ping(payload)
    }

    /// Sends `pong`, typically in answer to a `ping` event.
    pub fn pong(&self, payload: Option<Payload>) -> Result<()> {
        self.inner.sender.pong(payload)
    }

    /// Starts a subscription and returns its id.
    ///
    /// `sink` receives the subscription's `next` and `error` payloads and a
    /// single `complete` notification when the server ends it.
    pub fn subscribe(
        &self,
        payload: SubscribePayload,
        sink: SubscriptionSink,
    ) -> Result<SubscriptionId> {
        self.inner.subscriptions.subscribe(payload, sink)
    }

    /// Sends `next` for `id`.
    pub fn next(&self, id: &SubscriptionId, payload: ExecutionResult) -> Result<()> {
        self.inner.sender.next(id.clone(), payload)
    }

    /// Sends `error` for `id` and ends it locally.
    ///
    /// Only the first terminal call per id sends a frame.
    pub fn error(&self, id: &SubscriptionId, errors: Vec<GraphQLError>) -> Result<()> {
        if !self.finalize(id) {
            return Ok(());
        }
        self.inner.sender.error(id.clone(), errors)
    }

    /// Sends `complete` for `id` and ends it locally.
    ///
    /// Only the first terminal call per id sends a frame. If the
    /// `subscribe` frame for `id` is still queued it is never sent.
    pub fn complete(&self, id: &SubscriptionId) -> Result<()> {
        if !self.finalize(id) {
            return Ok(());
        }
        self.inner.sender.complete(id.clone())
    }

    /// Claims the terminal action for `id` and tears its listeners down.
    fn finalize(&self, id: &SubscriptionId) -> bool {
        if !self.inner.guard.try_finalize(id) {
            trace!(%id, "Duplicate terminal action suppressed");
            return false;
        }
        self.inner.subscriptions.teardown(id);
        true
    }
}

// ============================================================================
// Client - Handlers
// ============================================================================

impl Client {
    /// Adds a listener for `kind`. Listeners run in registration order,
    /// after the single-slot handler.
    pub fn on(&self, kind: EventKind, handler: Handler) -> ListenerId {
        self.inner.router.on(kind, handler)
    }

    /// Removes a listener added with [`Client::on`].
    pub fn off(&self, kind: EventKind, listener: ListenerId) -> bool {
        self.inner.router.off(kind, listener)
    }

    /// Sets (or with `None` clears) the single-slot handler for `kind`,
    /// replacing any previous one.
    pub fn set_handler(&self, kind: EventKind, handler: Option<Handler>) {
        self.inner.router.set_handler(kind, handler);
    }
}

// ============================================================================
// Client - State
// ============================================================================

impl Client {
    /// Returns the transport readiness.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.inner.sender.ready_state()
    }

    /// Returns `true` if `id` reached a terminal state.
    #[inline]
    #[must_use]
    pub fn is_finalized(&self, id: &SubscriptionId) -> bool {
        self.inner.guard.contains(id)
    }

    /// Number of active subscriptions.
    #[inline]
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.inner.subscriptions.active_count()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("ready_state", &self.ready_state())
            .field("active_subscriptions", &self.active_subscriptions())
            .field("pending_frames", &self.inner.sender.pending_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use rustc_hash::FxHashSet;
    use serde_json::{Value, json};

    use crate::events::{Event, handler};
    use crate::identifiers::{RandomIds, SequentialIds};

    fn client() -> (Client, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Client::from_channel(tx, Box::new(SequentialIds::new("op-"))), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::from_str(&frame).expect("valid frame"));
        }
        frames
    }

    #[test]
    fn test_connection_init_queued_until_ready() {
        let (client, mut rx) = client();
        client.connection_init(Some(Payload::new())).expect("send");
        assert!(drain(&mut rx).is_empty());

        client.mark_open();
        assert_eq!(
            drain(&mut rx),
            vec![json!({ "type": "connection_init", "payload": {} })]
        );
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_subscription_next_then_complete() {
        let (client, mut rx) = client();
        client.mark_open();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let next_seen = Arc::clone(&seen);
        let done_seen = Arc::clone(&seen);
        let id = client
            .subscribe(
                SubscribePayload::new("subscription { a }"),
                SubscriptionSink::new()
                    .on_next(move |result| {
                        let seen = Arc::clone(&next_seen);
                        async move { seen.lock().push(result.data.unwrap_or_default()) }
                    })
                    .on_complete(move || {
                        let seen = Arc::clone(&done_seen);
                        async move { seen.lock().push(json!("done")) }
                    }),
            )
            .expect("subscribe");
        assert_eq!(id.as_str(), "op-1");
        assert_eq!(drain(&mut rx)[0]["type"], "subscribe");

        client
            .receive(r#"{"type":"next","id":"op-1","payload":{"data":{"a":1}}}"#)
            .await;
        assert_eq!(*seen.lock(), vec![json!({ "a": 1 })]);

        client.receive(r#"{"type":"complete","id":"op-1"}"#).await;
        client
            .receive(r#"{"type":"next","id":"op-1","payload":{"data":{"a":2}}}"#)
            .await;

        assert_eq!(*seen.lock(), vec![json!({ "a": 1 }), json!("done")]);
        assert!(client.is_finalized(&id));
        assert_eq!(client.active_subscriptions(), 0);

        client.complete(&id).expect("complete");
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_double_complete_sends_once() {
        let (client, mut rx) = client();
        client.mark_open();

        let id = SubscriptionId::new("y");
        client.complete(&id).expect("complete");
        client.complete(&id).expect("complete");
        client
            .error(&id, vec![GraphQLError::new("late")])
            .expect("error");

        assert_eq!(drain(&mut rx), vec![json!({ "type": "complete", "id": "y" })]);
    }

    #[test]
    fn test_local_complete_cancels_queued_subscribe() {
        let (client, mut rx) = client();
        let id = client
            .subscribe(SubscribePayload::new("{ a }"), SubscriptionSink::new())
            .expect("subscribe");
        client.complete(&id).expect("complete");

        client.mark_open();
        assert_eq!(
            drain(&mut rx),
            vec![json!({ "type": "complete", "id": "op-1" })]
        );
        assert_eq!(client.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_unknown_event_on_bad_frame() {
        let (client, _rx) = client();
        let reasons = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&reasons);
        client.set_handler(
            EventKind::Unknown,
            Some(handler(move |event: Event| {
                if let Event::Unknown(e) = event {
                    sink.lock().push(e.reason().to_string());
                }
                async {}
            })),
        );

        client.receive("{{{").await;

        let reasons = reasons.lock();
        assert_eq!(reasons.len(), 1);
        assert!(!reasons[0].is_empty());
    }

    #[tokio::test]
    async fn test_close_discards_and_ends_subscriptions() {
        let (client, mut rx) = client();
        client.mark_open();
        let id = client
            .subscribe(SubscribePayload::new("{ a }"), SubscriptionSink::new())
            .expect("subscribe");
        drain(&mut rx);

        client.close();
        assert_eq!(client.ready_state(), ReadyState::Closing);
        client.ping(None).expect("discarded");
        assert!(drain(&mut rx).is_empty());

        client.handle_close();
        assert_eq!(client.ready_state(), ReadyState::Closed);
        assert_eq!(client.active_subscriptions(), 0);
        assert!(client.is_finalized(&id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribes_get_distinct_ids() {
        for ids in [
            Box::new(RandomIds) as Box<dyn IdGenerator>,
            Box::new(SequentialIds::new("op-")),
        ] {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let client = Client::from_channel(tx, ids);
            client.mark_open();

            let tasks: Vec<_> = (0..64)
                .map(|_| {
                    let client = client.clone();
                    tokio::spawn(async move {
                        client.subscribe(SubscribePayload::new("{ a }"), SubscriptionSink::new())
                    })
                })
                .collect();

            let mut seen = FxHashSet::default();
            for task in tasks {
                let id = task.await.expect("join").expect("subscribe");
                assert!(seen.insert(id), "duplicate subscription id");
            }
            assert_eq!(seen.len(), 64);
            assert_eq!(client.active_subscriptions(), 64);

            let sent: FxHashSet<String> = drain(&mut rx)
                .into_iter()
                .map(|frame| frame["id"].as_str().expect("id").to_string())
                .collect();
            assert_eq!(sent.len(), 64);
        }
    }

    #[tokio::test]
    async fn test_ping_answered_by_caller() {
        let (client, mut rx) = client();
        client.mark_open();

        let responder = client.clone();
        client.on(
            EventKind::Ping,
            handler(move |_| {
                let result = responder.pong(None);
                async move { result.expect("pong") }
            }),
        );

        client.receive(r#"{"type":"ping"}"#).await;
        assert_eq!(drain(&mut rx), vec![json!({ "type": "pong" })]);
    }
}
