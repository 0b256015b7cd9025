//! Typed events delivered to handlers.
//!
//! Each decoded [`Message`] becomes an [`Event::Message`]; a frame that
//! fails to decode becomes [`Event::Unknown`]. [`EventKind`] is the public
//! event name handlers register under.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::protocol::{DecodeError, Message};

// ============================================================================
// Types
// ============================================================================

/// Async callback receiving a value of type `T`.
pub type Callback<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Async event handler.
///
/// The router awaits the returned future before it processes the next
/// inbound frame.
pub type Handler = Callback<Event>;

/// Wraps an async closure as a [`Handler`].
///
/// # Example
///
/// ```ignore
/// let handler = handler(|event| async move {
///     println!("{:?}", event.kind());
/// });
/// ```
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    callback(f)
}

/// Wraps an async closure as a [`Callback`].
pub fn callback<T, F, Fut>(f: F) -> Callback<T>
where
    T: 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |value| f(value).boxed())
}

// ============================================================================
// EventKind
// ============================================================================

/// Public event names, one per message type plus `unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `connection_init` received.
    ConnectionInit,
    /// `connection_ack` received.
    ConnectionAck,
    /// `ping` received.
    Ping,
    /// `pong` received.
    Pong,
    /// `subscribe` received.
    Subscribe,
    /// `next` received.
    Next,
    /// `error` received.
    Error,
    /// `complete` received.
    Complete,
    /// A frame failed to decode.
    Unknown,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [EventKind; 9] = [
        Self::ConnectionInit,
        Self::ConnectionAck,
        Self::Ping,
        Self::Pong,
        Self::Subscribe,
        Self::Next,
        Self::Error,
        Self::Complete,
        Self::Unknown,
    ];

    /// Returns the event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionInit => "connection_init",
            Self::ConnectionAck => "connection_ack",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Subscribe => "subscribe",
            Self::Next => "next",
            Self::Error => "error",
            Self::Complete => "complete",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the kind an event for `message` is delivered under.
    #[must_use]
    pub const fn of(message: &Message) -> Self {
        match message {
            Message::ConnectionInit { .. } => Self::ConnectionInit,
            Message::ConnectionAck { .. } => Self::ConnectionAck,
            Message::Ping { .. } => Self::Ping,
            Message::Pong { .. } => Self::Pong,
            Message::Subscribe { .. } => Self::Subscribe,
            Message::Next { .. } => Self::Next,
            Message::Error { .. } => Self::Error,
            Message::Complete { .. } => Self::Complete,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event
// ============================================================================

/// An inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A decoded protocol message.
    Message(Message),
    /// A frame that failed to decode.
    Unknown(DecodeError),
}

impl Event {
    /// Returns the kind this event is delivered under.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Message(message) => EventKind::of(message),
            Self::Unknown(_) => EventKind::Unknown,
        }
    }

    /// Returns the decoded message, if any.
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message),
            Self::Unknown(_) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::SubscriptionId;

    #[test]
    fn test_kind_names_match_wire_types() {
        let complete = Message::Complete {
            id: SubscriptionId::new("1"),
        };
        assert_eq!(EventKind::of(&complete).as_str(), complete.type_name());
        assert_eq!(
            Event::Unknown(DecodeError::new("x")).kind(),
            EventKind::Unknown
        );
    }

    #[test]
    fn test_all_kinds_distinct() {
        let names: Vec<_> = EventKind::ALL.iter().map(EventKind::as_str).collect();
        let mut deduped = names.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
    }

    #[tokio::test]
    async fn test_handler_wraps_async_closure() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let h = handler(move |event: Event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event.kind());
            }
        });

        h(Event::Message(Message::Ping { payload: None })).await;
        assert_eq!(rx.try_recv().ok(), Some(EventKind::Ping));
    }
}
