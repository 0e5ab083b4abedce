//! Phase controller: the timer thread that cycles the signal and the
//! blocking waits built on top of it.
//!
//! The timer thread is the only writer of the current phase.  Each toggle is
//! stored in an [`AtomicPhase`] (so [`PhaseController::current_phase`] never
//! blocks) and then published on a [`NotificationChannel`], from which
//! [`PhaseController::wait_for_phase`] pulls one notification per iteration
//! until it sees the phase it is waiting for.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::channel::{NotificationChannel, RecvError};
use crate::config::SignalConfig;
use crate::error::SignalError;
use crate::phase::{AtomicPhase, Phase};
use crate::shutdown::ShutdownSignal;

/// Name given to the timer thread.
const TIMER_THREAD_NAME: &str = "signal-timer";

/// Timing of a single toggle, reported to a [`CycleObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleTiming {
    /// Phase the signal switched to.
    pub phase: Phase,
    /// Delay drawn from the configured interval before this toggle.
    pub planned: Duration,
    /// Measured time since the previous toggle (or since the timer started,
    /// for the first toggle).
    pub interval: Duration,
}

/// Hook invoked on the timer thread after every toggle.
///
/// Implementations must return quickly: the next delay is not drawn until
/// `on_toggle` returns.  Closures taking `&ToggleTiming` implement this
/// trait.
#[cfg_attr(test, mockall::automock)]
pub trait CycleObserver: Send + Sync {
    /// Called after the new phase has been published.
    fn on_toggle(&self, timing: &ToggleTiming);
}

impl<F> CycleObserver for F
where
    F: Fn(&ToggleTiming) + Send + Sync,
{
    fn on_toggle(&self, timing: &ToggleTiming) {
        self(timing);
    }
}

/// State shared between the controller and its timer thread.
#[derive(Debug, Default)]
struct Shared {
    phase: AtomicPhase,
    channel: NotificationChannel<Phase>,
}

/// A traffic signal that toggles between [`Phase::Red`] and [`Phase::Green`]
/// on a randomized interval.
///
/// Build with [`PhaseController::new`], then call [`start`](Self::start) to
/// launch the timer thread.  The signal starts at [`Phase::Red`].  Dropping
/// the controller stops the timer thread and releases every waiter.
pub struct PhaseController {
    shared: Arc<Shared>,
    config: SignalConfig,
    shutdown: ShutdownSignal,
    observer: Option<Arc<dyn CycleObserver>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for PhaseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseController")
            .field("phase", &self.current_phase())
            .field("config", &self.config)
            .field("shutdown", &self.shutdown)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn CycleObserver>"))
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl PhaseController {
    /// Create a stopped controller showing [`Phase::Red`].
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Config`] if `config` fails validation.
    pub fn new(config: SignalConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared::default()),
            config,
            shutdown: ShutdownSignal::new(),
            observer: None,
            worker: Mutex::new(None),
        })
    }

    /// Report every toggle to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: impl CycleObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Use an externally owned shutdown signal.
    ///
    /// Cancelling `shutdown` stops the timer thread and releases every
    /// waiter with [`SignalError::Stopped`], exactly like [`stop`](Self::stop)
    /// except that the thread is not joined.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// The signal that stops this controller's timer thread.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// The timing configuration this controller was built with.
    #[must_use]
    pub const fn config(&self) -> &SignalConfig {
        &self.config
    }

    fn worker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Launch the timer thread.
    ///
    /// Calling `start` on a controller that is already running does nothing,
    /// so there is never more than one timer thread writing the phase.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Stopped`] if the controller has been shut down
    /// and [`SignalError::Spawn`] if the thread could not be created.
    pub fn start(&self) -> Result<(), SignalError> {
        let mut worker = self.worker();
        if self.shutdown.is_cancelled() {
            return Err(SignalError::Stopped);
        }
        if worker.is_some() {
            tracing::debug!("signal already running, ignoring start");
            return Ok(());
        }

        let timer = PhaseTimer {
            shared: Arc::clone(&self.shared),
            config: self.config,
            shutdown: self.shutdown.clone(),
            observer: self.observer.clone(),
            rng: self
                .config
                .seed
                .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64),
        };
        let handle = thread::Builder::new()
            .name(TIMER_THREAD_NAME.to_string())
            .spawn(move || timer.run())
            .map_err(|source| SignalError::Spawn { source })?;
        *worker = Some(handle);
        drop(worker);

        tracing::info!(
            "signal started at {} ({}..={}ms)",
            self.current_phase(),
            self.config.min_cycle_millis,
            self.config.max_cycle_millis
        );
        Ok(())
    }

    /// Whether the timer thread has been started and is still cycling.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker()
            .as_ref()
            .is_some_and(|h| !h.is_finished() && !self.shutdown.is_cancelled())
    }

    /// The last phase the signal switched to.  Never blocks.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.shared.phase.load()
    }

    fn ensure_started(&self) -> Result<(), SignalError> {
        if self.worker().is_none() && !self.shared.channel.is_closed() {
            return Err(SignalError::NotStarted);
        }
        Ok(())
    }

    /// Block until the next phase change and return the new phase.
    ///
    /// Only the most recent change is kept, so changes that happen while no
    /// one is receiving are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::NotStarted`] before [`start`](Self::start) and
    /// [`SignalError::Stopped`] once the controller is shut down.
    pub fn next_phase(&self) -> Result<Phase, SignalError> {
        self.ensure_started()?;
        self.shared
            .channel
            .receive()
            .map_err(|_| SignalError::Stopped)
    }

    /// Block until the signal switches to `target`.
    ///
    /// Notifications for the other phase are consumed and discarded.  Returns
    /// on the next switch *to* `target`, even if the signal already shows it.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::NotStarted`] before [`start`](Self::start) and
    /// [`SignalError::Stopped`] if the controller is shut down while waiting.
    pub fn wait_for_phase(&self, target: Phase) -> Result<(), SignalError> {
        while self.next_phase()? != target {}
        Ok(())
    }

    /// [`wait_for_phase`](Self::wait_for_phase) with an upper bound on the
    /// total time spent waiting.
    ///
    /// # Errors
    ///
    /// As for `wait_for_phase`, plus [`SignalError::TimedOut`] if `target`
    /// was not observed within `timeout`.  A timeout too large to represent
    /// as a deadline waits without bound.
    pub fn wait_for_phase_timeout(
        &self,
        target: Phase,
        timeout: Duration,
    ) -> Result<(), SignalError> {
        self.ensure_started()?;
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait_for_phase(target);
        };
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.shared.channel.receive_timeout(remaining) {
                Ok(phase) if phase == target => return Ok(()),
                Ok(_) => {}
                Err(RecvError::Closed) => return Err(SignalError::Stopped),
                Err(RecvError::TimedOut) => return Err(SignalError::TimedOut { target, timeout }),
            }
        }
    }

    /// Shorthand for `wait_for_phase(Phase::Green)`.
    ///
    /// # Errors
    ///
    /// See [`wait_for_phase`](Self::wait_for_phase).
    pub fn wait_for_green(&self) -> Result<(), SignalError> {
        self.wait_for_phase(Phase::Green)
    }

    /// Stop the timer thread, release every waiter, and join the thread.
    ///
    /// Safe to call more than once.
    pub fn stop(&self) {
        self.shutdown.cancel();
        self.shared.channel.close();

        let Some(handle) = self.worker().take() else {
            return;
        };
        // An observer calling `stop` runs on the timer thread itself.
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::warn!("signal timer thread panicked");
        }
        tracing::info!("signal stopped at {}", self.current_phase());
    }
}

impl Drop for PhaseController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the timer thread owns.
struct PhaseTimer {
    shared: Arc<Shared>,
    config: SignalConfig,
    shutdown: ShutdownSignal,
    observer: Option<Arc<dyn CycleObserver>>,
    rng: StdRng,
}

impl PhaseTimer {
    fn next_delay(&mut self) -> Duration {
        Duration::from_millis(
            self.rng
                .random_range(self.config.min_cycle_millis..=self.config.max_cycle_millis),
        )
    }

    /// Toggle the phase after every randomized delay until shut down, then
    /// close the channel so waiters are not left blocked.
    fn run(mut self) {
        let mut last_toggle = Instant::now();
        loop {
            let planned = self.next_delay();
            if self.shutdown.sleep(planned) {
                break;
            }

            let phase = self.shared.phase.load().toggled();
            self.shared.phase.store(phase);
            self.shared.channel.send(phase);

            let now = Instant::now();
            let timing = ToggleTiming {
                phase,
                planned,
                interval: now.duration_since(last_toggle),
            };
            last_toggle = now;

            tracing::debug!(
                "signal -> {phase} (planned {}ms, measured {}ms)",
                planned.as_millis(),
                timing.interval.as_millis()
            );
            if let Some(observer) = &self.observer {
                observer.on_toggle(&timing);
            }
        }
        self.shared.channel.close();
    }
}
