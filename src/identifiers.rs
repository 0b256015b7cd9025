//! Type-safe identifiers.
//!
//! - [`SubscriptionId`] keys one subscription on the wire.
//! - [`ListenerId`] names one registered listener so it can be removed.
//!
//! Subscription ids are produced by an [`IdGenerator`], which is injected
//! into the client rather than read from a global. [`RandomIds`] is the
//! default; [`SequentialIds`] gives reproducible ids for tests and logs.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SubscriptionId
// ============================================================================

/// Identifier of a subscription.
///
/// Opaque string token. Ids generated locally are UUID v4; ids received from
/// the peer may be any non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Creates an identifier from any string.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random UUID v4 identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is the empty string.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubscriptionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// Handle for a listener registered on an event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wraps a raw listener number.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw listener number.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ============================================================================
// IdGenerator
// ============================================================================

/// Source of fresh subscription identifiers.
///
/// Implementations must never return the same id twice for one client.
pub trait IdGenerator: Send + Sync {
    /// Returns a new, unused identifier.
    fn generate(&self) -> SubscriptionId;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    #[inline]
    fn generate(&self) -> SubscriptionId {
        SubscriptionId::generate()
    }
}

/// Deterministic identifiers of the form `{prefix}{n}`, counting from 1.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    /// Creates a generator producing `{prefix}1`, `{prefix}2`, ...
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("")
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> SubscriptionId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        SubscriptionId::new(format!("{}{}", self.prefix, n))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_subscription_id_serde_transparent() {
        let id = SubscriptionId::new("abc");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, r#""abc""#);

        let back: SubscriptionId = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, id);
    }

    #[test]
    fn test_generated_id_is_uuid() {
        let id = SubscriptionId::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("sub-");
        assert_eq!(ids.generate().as_str(), "sub-1");
        assert_eq!(ids.generate().as_str(), "sub-2");
    }

    #[test]
    fn test_listener_id_display() {
        assert_eq!(ListenerId::new(7).to_string(), "listener-7");
    }

    proptest! {
        #[test]
        fn test_random_ids_are_distinct(count in 1usize..256) {
            let ids = RandomIds;
            let seen: FxHashSet<_> = (0..count).map(|_| ids.generate()).collect();
            prop_assert_eq!(seen.len(), count);
        }
    }
}
