// Shared helpers for integration tests.
//
// Provides fast-cycling controllers, a background waiter that reports back
// over an mpsc channel, and a temporary-directory-backed config file builder
// so each integration test can set up an isolated environment without
// repeating boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use traffic_signal::{PhaseController, SignalConfig};

/// Generous upper bound for anything that should happen "promptly" on a
/// loaded CI runner.
pub const PROMPT: Duration = Duration::from_secs(2);

/// Time given to spawned waiters to reach their blocking call.
pub const SETTLE: Duration = Duration::from_millis(50);

/// A controller that toggles every `millis` milliseconds, already started.
pub fn started_signal(millis: u64) -> PhaseController {
    let signal = PhaseController::new(SignalConfig::fixed(millis)).expect("valid config");
    signal.start().expect("start signal");
    signal
}

/// A blocking call running on its own thread.
///
/// The result is sent back over an mpsc channel so tests can check whether
/// the call has returned without joining (and possibly hanging) the thread.
pub struct Waiter<T> {
    rx: mpsc::Receiver<T>,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> Waiter<T> {
    /// Run `f` on a new thread.
    pub fn spawn(f: impl FnOnce() -> T + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            tx.send(f()).ok();
        });
        Self { rx, handle }
    }

    /// The result, if the call returns within `timeout`.
    pub fn result_within(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Wait for the result and join the thread.
    pub fn join(self) -> T {
        let value = self
            .rx
            .recv_timeout(PROMPT)
            .expect("waiter should return promptly");
        self.handle.join().expect("waiter thread should not panic");
        value
    }
}

/// An isolated directory holding a `signal.toml` config file.
///
/// The directory is automatically deleted when dropped (via the underlying
/// [`tempfile::TempDir`]).
pub struct ConfigFileContext {
    /// Temporary directory containing the config file.
    pub root: tempfile::TempDir,
}

impl ConfigFileContext {
    /// Create a context whose config file contains `content`.
    pub fn with_content(content: &str) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::write(root.path().join("signal.toml"), content).expect("write config file");
        Self { root }
    }

    /// Create a context with no config file at all.
    pub fn empty() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Path of the directory.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Path of the config file (which may not exist).
    pub fn config_path(&self) -> PathBuf {
        self.root.path().join("signal.toml")
    }
}
