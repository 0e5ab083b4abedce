//! Single-slot, most-recent-value-wins handoff channel.
//!
//! [`NotificationChannel`] buffers at most one value.  A [`send`] replaces any
//! value that has not been received yet, so a slow consumer only ever sees
//! the latest state rather than a backlog of history.  Each `send` wakes at
//! most one blocked [`receive`]; waiters are not served in any particular
//! order.
//!
//! [`send`]: NotificationChannel::send
//! [`receive`]: NotificationChannel::receive

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

/// Reason a receive returned without a value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// The channel was closed and no value is pending.
    #[error("channel closed")]
    Closed,
    /// The timeout elapsed before a value arrived.
    #[error("timed out waiting for a value")]
    TimedOut,
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    closed: bool,
}

impl<T> Slot<T> {
    const fn is_empty_and_open(&self) -> bool {
        self.value.is_none() && !self.closed
    }
}

/// Lossy handoff channel between one producer and any number of consumers.
///
/// The slot lock is only held while the slot is inspected or replaced; the
/// blocking wait in [`receive`](Self::receive) releases it through the
/// [`Condvar`], so a `send` can never be stalled by a waiting consumer.
#[derive(Debug)]
pub struct NotificationChannel<T> {
    slot: Mutex<Slot<T>>,
    /// Notified once per `send`, and for every waiter on `close`.
    available: Condvar,
}

impl<T> NotificationChannel<T> {
    /// Create an empty, open channel.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Lock the slot, recovering from poisoning.
    ///
    /// The slot is a plain `Option` plus a flag, so a panic while it was held
    /// cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value`, discarding any value not yet received, and wake one
    /// blocked receiver.
    ///
    /// Never blocks on a consumer.  Sending on a closed channel drops the
    /// value.
    pub fn send(&self, value: T) {
        let mut slot = self.lock();
        if slot.closed {
            return;
        }
        slot.value = Some(value);
        drop(slot);
        self.available.notify_one();
    }

    /// Block until a value is available, then take it.
    ///
    /// Blocks forever if nothing is ever sent and the channel is never
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError::Closed`] once the channel is closed and empty.
    pub fn receive(&self) -> Result<T, RecvError> {
        let mut slot = self
            .available
            .wait_while(self.lock(), |s| s.is_empty_and_open())
            .unwrap_or_else(PoisonError::into_inner);
        slot.value.take().ok_or(RecvError::Closed)
    }

    /// Like [`receive`](Self::receive), but gives up after `timeout`.
    ///
    /// A value that is present when the timeout fires is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError::TimedOut`] if no value arrived in time, or
    /// [`RecvError::Closed`] if the channel was closed while empty.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<T, RecvError> {
        let (mut slot, _) = self
            .available
            .wait_timeout_while(self.lock(), timeout, |s| s.is_empty_and_open())
            .unwrap_or_else(PoisonError::into_inner);
        match slot.value.take() {
            Some(value) => Ok(value),
            None if slot.closed => Err(RecvError::Closed),
            None => Err(RecvError::TimedOut),
        }
    }

    /// Take the pending value without blocking.
    pub fn try_receive(&self) -> Option<T> {
        self.lock().value.take()
    }

    /// Close the channel and wake every blocked receiver.
    ///
    /// A value already in the slot can still be received; after that every
    /// receive fails with [`RecvError::Closed`].
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        drop(slot);
        self.available.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T> Default for NotificationChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;

    use crate::phase::Phase;

    const SETTLE: Duration = Duration::from_millis(50);

    #[test]
    fn receive_returns_sent_value() {
        let ch = NotificationChannel::new();
        ch.send(Phase::Green);
        assert_eq!(ch.receive(), Ok(Phase::Green));
    }

    #[test]
    fn receive_empties_slot() {
        let ch = NotificationChannel::new();
        ch.send(1);
        assert_eq!(ch.receive(), Ok(1));
        assert_eq!(ch.try_receive(), None);
    }

    #[test]
    fn second_send_overwrites_first() {
        let ch = NotificationChannel::new();
        ch.send(Phase::Red);
        ch.send(Phase::Green);
        assert_eq!(ch.receive(), Ok(Phase::Green));
        assert_eq!(ch.try_receive(), None, "overwritten value must not linger");
    }

    #[test]
    fn receive_blocks_until_send() {
        let ch = Arc::new(NotificationChannel::new());
        let rx = Arc::clone(&ch);
        let handle = thread::spawn(move || rx.receive());
        thread::sleep(SETTLE);
        assert!(!handle.is_finished(), "receiver returned before any send");
        ch.send(7_u32);
        assert_eq!(handle.join().expect("receiver thread should complete"), Ok(7));
    }

    #[test]
    fn one_send_releases_exactly_one_of_two_waiters() {
        let ch = Arc::new(NotificationChannel::new());
        let (done_tx, done_rx) = mpsc::channel();
        let mut handles = Vec::new();
        for id in 0..2 {
            let ch = Arc::clone(&ch);
            let done_tx = done_tx.clone();
            handles.push(thread::spawn(move || {
                let phase = ch.receive();
                done_tx.send((id, phase)).ok();
            }));
        }
        thread::sleep(SETTLE);

        ch.send(Phase::Green);
        let (first, phase) = done_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("one waiter should be released");
        assert_eq!(phase, Ok(Phase::Green));
        assert!(
            done_rx.recv_timeout(Duration::from_millis(200)).is_err(),
            "second waiter must stay blocked after a single send"
        );

        ch.send(Phase::Green);
        let (second, phase) = done_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("second waiter should be released by the next send");
        assert_eq!(phase, Ok(Phase::Green));
        assert_ne!(first, second);

        for h in handles {
            h.join().expect("waiter thread should complete");
        }
    }

    #[test]
    fn one_send_releases_one_of_many_waiters() {
        const WAITERS: usize = 4;
        let ch = Arc::new(NotificationChannel::new());
        let (done_tx, done_rx) = mpsc::channel();
        for _ in 0..WAITERS {
            let ch = Arc::clone(&ch);
            let done_tx = done_tx.clone();
            thread::spawn(move || {
                if ch.receive().is_ok() {
                    done_tx.send(()).ok();
                }
            });
        }
        thread::sleep(SETTLE);

        ch.send(());
        done_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("one waiter should be released");
        thread::sleep(Duration::from_millis(100));
        assert_eq!(done_rx.try_iter().count(), 0, "only one waiter may wake");

        // Release the rest so no thread outlives the test.
        ch.close();
    }

    #[test]
    fn receive_timeout_on_empty_channel() {
        let ch: NotificationChannel<u8> = NotificationChannel::new();
        assert_eq!(
            ch.receive_timeout(Duration::from_millis(20)),
            Err(RecvError::TimedOut)
        );
    }

    #[test]
    fn receive_timeout_returns_pending_value() {
        let ch = NotificationChannel::new();
        ch.send("ready");
        assert_eq!(ch.receive_timeout(Duration::ZERO), Ok("ready"));
    }

    #[test]
    fn close_wakes_all_waiters() {
        let ch: Arc<NotificationChannel<Phase>> = Arc::new(NotificationChannel::new());
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let ch = Arc::clone(&ch);
                thread::spawn(move || ch.receive())
            })
            .collect();
        thread::sleep(SETTLE);
        ch.close();
        for h in handles {
            assert_eq!(
                h.join().expect("waiter thread should complete"),
                Err(RecvError::Closed)
            );
        }
    }

    #[test]
    fn close_still_delivers_pending_value() {
        let ch = NotificationChannel::new();
        ch.send(3);
        ch.close();
        assert!(ch.is_closed());
        assert_eq!(ch.receive(), Ok(3));
        assert_eq!(ch.receive(), Err(RecvError::Closed));
    }

    #[test]
    fn send_after_close_is_dropped() {
        let ch = NotificationChannel::new();
        ch.close();
        ch.send(1);
        assert_eq!(ch.try_receive(), None);
        assert_eq!(
            ch.receive_timeout(Duration::from_millis(10)),
            Err(RecvError::Closed)
        );
    }

    #[test]
    fn consumer_never_observes_older_value() {
        let ch = Arc::new(NotificationChannel::new());
        let producer = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || {
                for i in 1..=2_000_u32 {
                    ch.send(i);
                }
                ch.close();
            })
        };

        let mut last = 0;
        while let Ok(value) = ch.receive() {
            assert!(value > last, "received {value} after {last}");
            last = value;
        }
        producer.join().expect("producer thread should complete");
        assert!(last > 0);
    }
}
