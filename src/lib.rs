//! Randomized two-phase traffic signal.
//!
//! A [`PhaseController`] toggles between [`Phase::Red`] and [`Phase::Green`]
//! on a dedicated thread after a random delay drawn from a configured
//! interval, and publishes every change through a single-slot
//! [`NotificationChannel`].  Callers block in
//! [`PhaseController::wait_for_phase`] until the phase they need comes up.
//!
//! The crate is organised into layers:
//!
//! - **[`channel`]** and **[`shutdown`]**: blocking synchronisation primitives
//! - **[`phase`]** and **[`controller`]**: the signal state machine
//! - **[`config`]** and **[`error`]**: timing parameters and error types
//! - **[`cli`]**, **[`commands`]**, and **[`logging`]**: the command-line front end
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]
// `mockall::automock` output in test builds.
#![cfg_attr(
    test,
    allow(missing_docs, missing_debug_implementations, unused_qualifications)
)]

pub mod channel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod phase;
pub mod shutdown;

pub use channel::{NotificationChannel, RecvError};
pub use config::SignalConfig;
pub use controller::{CycleObserver, PhaseController, ToggleTiming};
pub use error::{ConfigError, SignalError};
pub use phase::Phase;
pub use shutdown::ShutdownSignal;
