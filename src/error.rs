//! Domain-specific error types for the traffic signal.
//!
//! Library code returns the typed errors defined here; the CLI boundary in
//! [`crate::commands`] converts them to [`anyhow::Error`] via `?`.
//!
//! # Error hierarchy
//!
//! ```text
//! SignalError
//! ├── NotStarted            — waited on a controller that was never started
//! ├── Spawn                 — the timer thread could not be created
//! ├── Stopped               — the controller shut down during a wait
//! ├── TimedOut              — a bounded wait elapsed
//! └── Config(ConfigError)   — bounds, file I/O, parsing
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::phase::Phase;

/// Top-level error type for signal operations.
#[derive(Error, Debug)]
pub enum SignalError {
    /// A caller waited for a phase before [`start`](crate::PhaseController::start)
    /// was called, so no phase change could ever arrive.
    #[error("Signal has not been started")]
    NotStarted,

    /// The operating system refused to create the timer thread.
    #[error("Failed to spawn signal timer thread: {source}")]
    Spawn {
        /// Underlying error from [`std::thread::Builder::spawn`].
        source: std::io::Error,
    },

    /// The controller was stopped while a caller was waiting.
    #[error("Signal was stopped")]
    Stopped,

    /// A bounded wait elapsed before the target phase was observed.
    #[error("Timed out after {}ms waiting for {target}", .timeout.as_millis())]
    TimedOut {
        /// Phase the caller was waiting for.
        target: Phase,
        /// How long the caller waited.
        timeout: Duration,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that arise from loading and validating [`SignalConfig`](crate::config::SignalConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The cycle bounds do not describe a usable interval.
    #[error("Invalid cycle bounds: min {min}ms, max {max}ms")]
    InvalidBounds {
        /// Lower bound in milliseconds.
        min: u64,
        /// Upper bound in milliseconds.
        max: u64,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {}: {source}", .path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or contains unknown keys.
    #[error("Invalid TOML in {}: {message}", .path.display())]
    Parse {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A phase name could not be parsed.
    #[error("Invalid phase '{0}': must be one of red, green")]
    InvalidPhase(String),
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn not_started_display() {
        insta::assert_snapshot!(SignalError::NotStarted.to_string(), @"Signal has not been started");
    }

    #[test]
    fn timed_out_display() {
        let e = SignalError::TimedOut {
            target: Phase::Green,
            timeout: Duration::from_millis(250),
        };
        insta::assert_snapshot!(e.to_string(), @"Timed out after 250ms waiting for green");
    }

    #[test]
    fn spawn_display_includes_source() {
        let e = SignalError::Spawn {
            source: io::Error::new(io::ErrorKind::OutOfMemory, "no threads left"),
        };
        assert!(e.to_string().contains("no threads left"));
    }

    #[test]
    fn spawn_has_source() {
        use std::error::Error as StdError;
        let e = SignalError::Spawn {
            source: io::Error::other("boom"),
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn invalid_bounds_display() {
        let e = ConfigError::InvalidBounds { min: 6000, max: 4000 };
        insta::assert_snapshot!(e.to_string(), @"Invalid cycle bounds: min 6000ms, max 4000ms");
    }

    #[test]
    fn invalid_phase_display() {
        let e = ConfigError::InvalidPhase("amber".to_string());
        assert_eq!(e.to_string(), "Invalid phase 'amber': must be one of red, green");
    }

    #[test]
    fn config_io_display() {
        let e = ConfigError::Io {
            path: PathBuf::from("/etc/signal.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/etc/signal.toml"));
        assert!(e.to_string().contains("IO error reading config file"));
    }

    #[test]
    fn signal_error_from_config_error() {
        let e: SignalError = ConfigError::InvalidBounds { min: 1, max: 0 }.into();
        assert!(e.to_string().starts_with("Configuration error"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<SignalError>();
        assert_send_sync::<ConfigError>();
    }

    #[test]
    fn signal_error_converts_to_anyhow() {
        let _anyhow_err: anyhow::Error = SignalError::Stopped.into();
    }
}
