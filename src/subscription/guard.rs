//! Completion guard.
//!
//! Set of subscription ids that reached a terminal state. Membership means
//! no further terminal frame is sent for the id and no further inbound frame
//! for it is dispatched. Entries are never removed.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::identifiers::SubscriptionId;

// ============================================================================
// CompletionGuard
// ============================================================================

/// Finalized subscription ids.
#[derive(Debug, Default)]
pub struct CompletionGuard {
    finalized: Mutex<FxHashSet<SubscriptionId>>,
}

impl CompletionGuard {
    /// Creates an empty guard.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` finalized.
    ///
    /// Returns `true` only for the call that added it.
    pub fn try_finalize(&self, id: &SubscriptionId) -> bool {
        let mut finalized = self.finalized.lock();
        if finalized.contains(id) {
            return false;
        }
        finalized.insert(id.clone())
    }

    /// Returns `true` if `id` is finalized.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.finalized.lock().contains(id)
    }

    /// Number of finalized ids.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.finalized.lock().len()
    }

    /// Returns `true` if nothing has been finalized.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.finalized.lock().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
