//! Outbound sending and the WebSocket binding.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  frames   ┌──────────────┐   WebSocket    ┌──────────┐
//! │  Client API  │──────────►│OutboundSender│───────────────►│          │
//! │              │           │ (queue while │   writer task  │  Server  │
//! │              │◄──────────│  connecting) │◄───────────────│          │
//! └──────────────┘  router   └──────────────┘   reader loop  └──────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ClientBuilder::connect` - sender starts `Connecting`, frames queue
//! 2. Handshake with `graphql-transport-ws` sub-protocol
//! 3. Sender `Open` - queue flushed in call order
//! 4. `Client::close` - sender `Closing`, sends discarded
//! 5. Socket ends - sender `Closed`, subscriptions completed silently
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket reader/writer tasks |
//! | `sender` | Outbound sender and pending queue |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket reader/writer tasks.
pub(crate) mod connection;

/// Outbound sender and pending queue.
pub mod sender;

// ============================================================================
// Re-exports
// ============================================================================

pub use sender::{Disposer, OutboundSender, ReadyState};
