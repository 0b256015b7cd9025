//! Subscription lifecycle and terminal-state bookkeeping.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `guard` | Completion guard (at most one terminal frame per id) |
//! | `manager` | Subscription lifecycle manager |
//! | `sink` | Caller callbacks |

// ============================================================================
// Submodules
// ============================================================================

/// Completion guard.
pub mod guard;

/// Subscription lifecycle manager.
pub mod manager;

/// Caller callbacks for one subscription.
pub mod sink;

// ============================================================================
// Re-exports
// ============================================================================

pub use guard::CompletionGuard;
pub use manager::SubscriptionManager;
pub use sink::SubscriptionSink;
