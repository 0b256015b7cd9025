//! Outbound frame sender.
//!
//! Serializes protocol messages and hands them to the transport writer.
//! Behaviour depends on the socket's [`ReadyState`]:
//!
//! | State | Effect of a send |
//! |-------|------------------|
//! | `Connecting` | Frame appended to the pending queue |
//! | `Open` | Frame transmitted immediately |
//! | `Closing` / `Closed` | Frame discarded |
//!
//! The pending queue is flushed once, in call order, on [`OutboundSender::mark_open`].

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::SubscriptionId;
use crate::protocol::{
    ExecutionResult, GraphQLError, Message, Payload, SubscribePayload, encode,
};

// ============================================================================
// ReadyState
// ============================================================================

/// Transport readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Handshake in progress.
    Connecting,
    /// Frames can be transmitted.
    Open,
    /// Close requested locally.
    Closing,
    /// Socket is gone.
    Closed,
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        })
    }
}

// ============================================================================
// Disposer
// ============================================================================

/// Cancels a frame that has not been transmitted yet.
///
/// The frame and the disposer share one claim flag: whichever of flush or
/// [`Disposer::dispose`] claims it first wins.
#[derive(Debug, Clone, Default)]
pub struct Disposer {
    claim: Option<Arc<AtomicBool>>,
}

impl Disposer {
    /// A disposer with nothing left to cancel.
    #[inline]
    #[must_use]
    pub fn inert() -> Self {
        Self::default()
    }

    /// Cancels the frame if it is still queued.
    ///
    /// Returns `true` if this call prevented the frame from being sent.
    pub fn dispose(&self) -> bool {
        self.claim
            .as_ref()
            .is_some_and(|claim| !claim.swap(true, Ordering::AcqRel))
    }
}

// ============================================================================
// OutboundSender
// ============================================================================

/// A serialized frame awaiting an open transport.
struct PendingFrame {
    frame: String,
    claim: Arc<AtomicBool>,
}

/// Mutable sender state.
struct SenderState {
    ready: ReadyState,
    queue: VecDeque<PendingFrame>,
}

/// Serializes messages and forwards them to the transport writer.
pub struct OutboundSender {
    state: Mutex<SenderState>,
    sink: mpsc::UnboundedSender<String>,
}

impl OutboundSender {
    /// Creates a sender in the `Connecting` state writing to `sink`.
    #[must_use]
    pub fn new(sink: mpsc::UnboundedSender<String>) -> Self {
        Self {
            state: Mutex::new(SenderState {
                ready: ReadyState::Connecting,
                queue: VecDeque::new(),
            }),
            sink,
        }
    }

    /// Returns the current transport readiness.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.state.lock().ready
    }

    /// Returns the number of frames waiting for the transport.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Marks the transport open and flushes the pending queue in order.
    ///
    /// Has no effect unless the sender is `Connecting`.
    pub fn mark_open(&self) {
        let mut state = self.state.lock();
        if state.ready != ReadyState::Connecting {
            return;
        }
        state.ready = ReadyState::Open;

        let mut flushed = 0usize;
        let mut skipped = 0usize;
        while let Some(pending) = state.queue.pop_front() {
            if pending.claim.swap(true, Ordering::AcqRel) {
                skipped += 1;
                continue;
            }
            self.transmit(pending.frame);
            flushed += 1;
        }

        debug!(flushed, skipped, "Transport open, pending frames flushed");
    }

    /// Marks the transport closing; queued and future frames are discarded.
    pub fn mark_closing(&self) {
        self.transition(ReadyState::Closing);
    }

    /// Marks the transport closed; queued and future frames are discarded.
    pub fn mark_closed(&self) {
        self.transition(ReadyState::Closed);
    }

    fn transition(&self, next: ReadyState) {
        let mut state = self.state.lock();
        if state.ready == ReadyState::Closed {
            return;
        }
        state.ready = next;

        let dropped = state.queue.len();
        state.queue.clear();
        if dropped > 0 {
            debug!(dropped, state = %next, "Discarded pending frames");
        }
    }

    // ========================================================================
    // Per-message sends
    // ========================================================================

    /// Sends `connection_init`.
    pub fn connection_init(&self, payload: Option<Payload>) -> Result<()> {
        self.send(&Message::ConnectionInit { payload }).map(drop)
    }

    /// Sends `connection_ack`.
    pub fn connection_ack(&self, payload: Option<Payload>) -> Result<()> {
        self.send(&Message::ConnectionAck { payload }).map(drop)
    }

    /// Sends `ping`.
    pub fn ping(&self, payload: Option<Payload>) -> Result<()> {
        self.send(&Message::Ping { payload }).map(drop)
    }

    /// Sends `pong`.
    pub fn pong(&self, payload: Option<Payload>) -> Result<()> {
        self.send(&Message::Pong { payload }).map(drop)
    }

    /// Sends `subscribe`, returning a disposer for the frame.
    pub fn subscribe(&self, id: SubscriptionId, payload: SubscribePayload) -> Result<Disposer> {
        self.send(&Message::Subscribe { id, payload })
    }

    /// Sends `next`.
    pub fn next(&self, id: SubscriptionId, payload: ExecutionResult) -> Result<()> {
        self.send(&Message::Next { id, payload }).map(drop)
    }

    /// Sends `error`.
    pub fn error(&self, id: SubscriptionId, payload: Vec<GraphQLError>) -> Result<()> {
        self.send(&Message::Error { id, payload }).map(drop)
    }

    /// Sends `complete`.
    pub fn complete(&self, id: SubscriptionId) -> Result<()> {
        self.send(&Message::Complete { id }).map(drop)
    }

    /// Serializes and queues, transmits or discards one message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the message cannot be serialized.
    pub fn send(&self, message: &Message) -> Result<Disposer> {
        let frame = encode(message)?;
        let mut state = self.state.lock();

        match state.ready {
            ReadyState::Connecting => {
                let claim = Arc::new(AtomicBool::new(false));
                state.queue.push_back(PendingFrame {
                    frame,
                    claim: Arc::clone(&claim),
                });
                trace!(kind = message.type_name(), "Frame queued");
                Ok(Disposer { claim: Some(claim) })
            }
            ReadyState::Open => {
                self.transmit(frame);
                trace!(kind = message.type_name(), "Frame sent");
                Ok(Disposer::inert())
            }
            ReadyState::Closing | ReadyState::Closed => {
                trace!(kind = message.type_name(), state = %state.ready, "Frame discarded");
                Ok(Disposer::inert())
            }
        }
    }

    fn transmit(&self, frame: String) {
        if self.sink.send(frame).is_err() {
            debug!("Transport writer gone, frame dropped");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
