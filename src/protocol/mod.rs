//! graphql-transport-ws message types and codec.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `connection_init` | Client → Server | Open the session |
//! | `connection_ack` | Server → Client | Session accepted |
//! | `ping` / `pong` | Both | Liveness |
//! | `subscribe` | Client → Server | Start an operation |
//! | `next` | Server → Client | One operation result |
//! | `error` | Server → Client | Operation errors |
//! | `complete` | Both | Operation finished or cancelled |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | Frame decoding and encoding |
//! | `message` | Message and payload types |

// ============================================================================
// Constants
// ============================================================================

/// WebSocket sub-protocol name requested during the handshake.
pub const SUBPROTOCOL: &str = "graphql-transport-ws";

// ============================================================================
// Submodules
// ============================================================================

/// Frame decoding and encoding.
pub mod codec;

/// Message and payload types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{DecodeError, decode, encode};
pub use message::{
    ExecutionResult, GraphQLError, Location, Message, PathSegment, Payload, SubscribePayload,
};
