//! Command: block until the signal reaches a phase.
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::cli::{GlobalOpts, WaitOpts};
use crate::controller::PhaseController;
use crate::error::SignalError;
use crate::logging::{PHASE_TARGET, STAGE_TARGET};
use crate::phase::Phase;

/// Run the `wait` command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the signal cannot be
/// started, the timeout elapses, or the wait is interrupted.
pub fn run(global: &GlobalOpts, opts: &WaitOpts) -> Result<()> {
    let config = super::load_config(global)?;
    let signal = PhaseController::new(config)?;
    super::stop_on_interrupt(signal.shutdown_signal())?;
    signal.start()?;

    tracing::info!(target: STAGE_TARGET, "Waiting for {}", opts.phase);
    let waited = wait_for(
        &signal,
        opts.phase,
        opts.timeout_millis.map(Duration::from_millis),
    )?;
    tracing::info!(
        target: PHASE_TARGET,
        "{}: reached after {}ms",
        opts.phase,
        waited.as_millis()
    );
    Ok(())
}

/// Wait for `target`, optionally bounded by `timeout`, and return how long
/// the wait took.
///
/// # Errors
///
/// Propagates the [`SignalError`] from the underlying wait.
pub fn wait_for(
    signal: &PhaseController,
    target: Phase,
    timeout: Option<Duration>,
) -> Result<Duration, SignalError> {
    let started = Instant::now();
    match timeout {
        Some(timeout) => signal.wait_for_phase_timeout(target, timeout)?,
        None => signal.wait_for_phase(target)?,
    }
    Ok(started.elapsed())
}
