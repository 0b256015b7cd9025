//! Inbound event routing.
//!
//! # Architecture
//!
//! ```text
//! raw frame ──► EventRouter ──decode──► Event
//!                   │
//!                   ├──► single-slot handler (per kind, last writer wins)
//!                   └──► EventBus listeners (per kind, registration order)
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `bus` | `EventTarget` trait and multi-listener bus |
//! | `event` | Event, event kinds and handler types |
//! | `router` | Decoding and two-sink dispatch |

// ============================================================================
// Submodules
// ============================================================================

/// `EventTarget` trait and multi-listener bus.
pub mod bus;

/// Event, event kinds and handler types.
pub mod event;

/// Decoding and two-sink dispatch.
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{EventBus, EventTarget};
pub use event::{Callback, Event, EventKind, Handler, callback, handler};
pub use router::EventRouter;
