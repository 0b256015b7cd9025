//! Caller callbacks for one subscription.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;

use crate::events::{Callback, callback};
use crate::protocol::{ExecutionResult, GraphQLError};

// ============================================================================
// SubscriptionSink
// ============================================================================

/// Callbacks invoked for a subscription's `next`, `error` and `complete`
/// frames.
///
/// # Example
///
/// ```ignore
/// let sink = SubscriptionSink::new()
///     .on_next(|result| async move { println!("{:?}", result.data) })
///     .on_complete(|| async { println!("done") });
/// ```
#[derive(Clone, Default)]
pub struct SubscriptionSink {
    pub(crate) on_next: Option<Callback<ExecutionResult>>,
    pub(crate) on_error: Option<Callback<Vec<GraphQLError>>>,
    pub(crate) on_complete: Option<Callback<()>>,
}

impl SubscriptionSink {
    /// Creates a sink with no callbacks.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with each `next` payload.
    #[must_use]
    pub fn on_next<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ExecutionResult) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_next = Some(callback(f));
        self
    }

    /// Called with each `error` payload. Does not end the subscription.
    #[must_use]
    pub fn on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Vec<GraphQLError>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(callback(f));
        self
    }

    /// Called once when the server completes the subscription.
    #[must_use]
    pub fn on_complete<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_complete = Some(callback(move |()| f()));
        self
    }
}

impl fmt::Debug for SubscriptionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSink")
            .field("on_next", &self.on_next.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}
