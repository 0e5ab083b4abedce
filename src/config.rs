//! Signal timing configuration.
//!
//! Values come from built-in defaults, optionally overlaid by a TOML file and
//! then by command-line flags:
//!
//! ```toml
//! min_cycle_millis = 4000
//! max_cycle_millis = 6000
//! seed = 42            # optional, makes the interval sequence reproducible
//! ```
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default lower bound of the randomized toggle interval.
pub const DEFAULT_MIN_CYCLE_MILLIS: u64 = 4000;
/// Default upper bound of the randomized toggle interval.
pub const DEFAULT_MAX_CYCLE_MILLIS: u64 = 6000;

/// Timing parameters for a [`PhaseController`](crate::PhaseController).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalConfig {
    /// Lower bound (inclusive) of the delay between two toggles.
    pub min_cycle_millis: u64,
    /// Upper bound (inclusive) of the delay between two toggles.
    pub max_cycle_millis: u64,
    /// Seed for the interval RNG; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_cycle_millis: DEFAULT_MIN_CYCLE_MILLIS,
            max_cycle_millis: DEFAULT_MAX_CYCLE_MILLIS,
            seed: None,
        }
    }
}

impl SignalConfig {
    /// A configuration that toggles every `millis` milliseconds exactly.
    #[must_use]
    pub const fn fixed(millis: u64) -> Self {
        Self {
            min_cycle_millis: millis,
            max_cycle_millis: millis,
            seed: None,
        }
    }

    /// Load a config file, falling back to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Parse`] if it is not valid TOML for this type, and
    /// [`ConfigError::InvalidBounds`] if the loaded values fail
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the bounds describe a usable interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBounds`] if `min > max` or `max == 0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cycle_millis > self.max_cycle_millis || self.max_cycle_millis == 0 {
            return Err(ConfigError::InvalidBounds {
                min: self.min_cycle_millis,
                max: self.max_cycle_millis,
            });
        }
        Ok(())
    }

    /// Lower bound as a [`Duration`].
    #[must_use]
    pub const fn min_cycle(&self) -> Duration {
        Duration::from_millis(self.min_cycle_millis)
    }

    /// Upper bound as a [`Duration`].
    #[must_use]
    pub const fn max_cycle(&self) -> Duration {
        Duration::from_millis(self.max_cycle_millis)
    }
}
