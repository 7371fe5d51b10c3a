//! Cooperative cancellation with a first-wins cause.
//!
//! A [`CancelToken`] is the context a caller passes into a search. The search
//! derives a child token that doubles as the shared error slot for its
//! workers: the first worker to fail stores its error and every other worker
//! sees the cancellation at its next check.

use crate::error::SearchError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    cause: Mutex<Option<SearchError>>,
    parent: Option<CancelToken>,
}

/// Cloneable cancellation handle. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Creates a root token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a token that is cancelled whenever `self` is, but whose own
    /// cancellation does not propagate back up.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(Inner {
                parent: Some(self.clone()),
                ..Inner::default()
            }),
        }
    }

    /// Cancels the token with `cause`. Only the first cause is kept; returns
    /// `true` if this call stored it.
    pub fn cancel(&self, cause: SearchError) -> bool {
        let mut slot = self.inner.cause.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(cause);
        self.inner.cancelled.store(true, Ordering::Release);
        true
    }

    /// Whether this token or any ancestor has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }
        self.inner
            .parent
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    }

    /// The cause stored on this token (not its ancestors).
    pub fn cause(&self) -> Option<SearchError> {
        self.inner.cause.lock().clone()
    }
}
