//! Command: run the signal and report every phase change.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{GlobalOpts, RunOpts};
use crate::controller::{PhaseController, ToggleTiming};
use crate::error::SignalError;
use crate::logging::{PHASE_TARGET, STAGE_TARGET};
use crate::phase::Phase;

/// What a waiting vehicle does on each phase.
const fn action(phase: Phase) -> &'static str {
    match phase {
        Phase::Red => "stop",
        Phase::Green => "proceed",
    }
}

/// Run the `run` command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the Ctrl-C handler or
/// timer thread cannot be installed, or the signal fails while waiting.
pub fn run(global: &GlobalOpts, opts: &RunOpts) -> Result<()> {
    let config = super::load_config(global)?;

    let signal = Arc::new(PhaseController::new(config)?.with_observer(|t: &ToggleTiming| {
        tracing::debug!(
            "toggle to {} after {}ms (planned {}ms)",
            t.phase,
            t.interval.as_millis(),
            t.planned.as_millis()
        );
    }));
    super::stop_on_interrupt(signal.shutdown_signal())?;

    tracing::info!(target: STAGE_TARGET, "Starting signal");
    signal.start()?;

    let observed = observe(&signal, opts.cycles)?;
    signal.stop();

    tracing::info!(target: STAGE_TARGET, "Observed {observed} phase change(s)");
    Ok(())
}

/// Follow the signal like a waiting vehicle: wait for the phase opposite to
/// the current one, report it, and repeat.
///
/// Stops after `limit` phase changes, or when the signal is stopped.
/// Returns the number of phase changes observed.
///
/// # Errors
///
/// Returns [`SignalError::NotStarted`] if `signal` was never started.
pub fn observe(signal: &PhaseController, limit: Option<u64>) -> Result<u64, SignalError> {
    let mut target = signal.current_phase().toggled();
    let mut observed = 0;
    while limit.is_none_or(|n| observed < n) {
        match signal.wait_for_phase(target) {
            Ok(()) => {}
            Err(SignalError::Stopped) => break,
            Err(e) => return Err(e),
        }
        observed += 1;
        tracing::info!(target: PHASE_TARGET, "{target}: {}", action(target));
        target = target.toggled();
    }
    Ok(observed)
}
