//! Cooperative cancellation for the signal timer thread.
//!
//! `ShutdownSignal` is a cheaply-clonable flag paired with a [`Condvar`] so
//! that a thread sleeping through [`ShutdownSignal::sleep`] wakes as soon as
//! [`ShutdownSignal::cancel`] is called instead of finishing its delay.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

/// Shared cancellation token.
///
/// Create one with [`ShutdownSignal::new`] and clone it into every thread
/// that must observe the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    /// Create a new signal in the "running" state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Request cancellation and wake every sleeper.
    pub fn cancel(&self) {
        let mut cancelled = self.lock();
        *cancelled = true;
        drop(cancelled);
        self.inner.condvar.notify_all();
    }

    /// Returns `true` once [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` if the sleep ended because of cancellation (including
    /// when the signal was already cancelled on entry).
    #[must_use]
    pub fn sleep(&self, duration: Duration) -> bool {
        let (cancelled, _) = self
            .inner
            .condvar
            .wait_timeout_while(self.lock(), duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled
    }
}
