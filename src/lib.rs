//! graphql-ws-client - Client engine for the `graphql-transport-ws` protocol.
//!
//! This library implements the client side of the GraphQL over WebSocket
//! sub-protocol: framing outgoing messages, decoding inbound frames, routing
//! them to handlers, and delivering each subscription's terminal frame
//! exactly once.
//!
//! # Architecture
//!
//! ```text
//! socket ──► EventRouter ──► single-slot handler
//!               │       └──► EventBus ──► SubscriptionManager (per id)
//!               ▼
//!        CompletionGuard ◄── Client::complete / Client::error
//!
//! Client API ──► OutboundSender ──► socket (queued while connecting)
//! ```
//!
//! Key design principles:
//!
//! - One reader per socket; inbound frames are handled strictly in order
//! - A subscription's terminal frame is sent and delivered at most once
//! - Frames sent before the handshake completes are queued, not lost
//! - Sends after close are dropped silently
//!
//! # Quick Start
//!
//! ```no_run
//! use graphql_ws_client::{Client, Payload, Result, SubscribePayload, SubscriptionSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .url("ws://localhost:4000/graphql")
//!         .connection_init(Payload::new())
//!         .connect()?;
//!
//!     let id = client.subscribe(
//!         SubscribePayload::new("subscription { greetings }"),
//!         SubscriptionSink::new()
//!             .on_next(|result| async move { println!("{:?}", result.data) })
//!             .on_complete(|| async { println!("done") }),
//!     )?;
//!
//!     client.complete(&id)?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`] facade and [`ClientBuilder`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | Events, handlers, bus and router |
//! | [`identifiers`] | Subscription and listener ids |
//! | [`protocol`] | Message types and codec |
//! | [`subscription`] | Lifecycle manager and completion guard |
//! | [`transport`] | Outbound sender and WebSocket binding |

// ============================================================================
// Modules
// ============================================================================

/// Client configuration and public facade.
pub mod client;

/// Error types and result aliases.
pub mod error;

/// Events, handlers, bus and router.
pub mod events;

/// Subscription and listener identifiers.
pub mod identifiers;

/// graphql-transport-ws message types and codec.
pub mod protocol;

/// Subscription lifecycle and completion guard.
pub mod subscription;

/// Outbound sender and WebSocket binding.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder};

// Error types
pub use error::{Error, Result};

// Event types
pub use events::{Event, EventKind, EventTarget, Handler, handler};

// Identifier types
pub use identifiers::{IdGenerator, ListenerId, RandomIds, SequentialIds, SubscriptionId};

// Protocol types
pub use protocol::{
    DecodeError, ExecutionResult, GraphQLError, Message, Payload, SUBPROTOCOL, SubscribePayload,
};

// Subscription types
pub use subscription::SubscriptionSink;

// Transport types
pub use transport::ReadyState;
