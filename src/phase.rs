//! Signal phases and a tear-free shared phase cell.
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::ConfigError;

/// One of the two states a signal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Traffic must stop. Every signal starts here.
    #[default]
    Red,
    /// Traffic may proceed.
    Green,
}

impl Phase {
    /// The phase that follows `self`.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }

    /// Lowercase name used in logs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
        }
    }

    const fn to_bits(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Green => 1,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        if bits == 0 { Self::Red } else { Self::Green }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            _ => Err(ConfigError::InvalidPhase(s.to_string())),
        }
    }
}

/// A [`Phase`] that can be shared between threads without a lock.
///
/// Stored as a single byte so every load observes a complete value. Intended
/// for single-writer use: only the timer thread calls [`AtomicPhase::store`].
#[derive(Debug)]
pub struct AtomicPhase(AtomicU8);

impl AtomicPhase {
    /// Create a cell holding `phase`.
    #[must_use]
    pub const fn new(phase: Phase) -> Self {
        Self(AtomicU8::new(phase.to_bits()))
    }

    /// Read the current phase.
    pub fn load(&self) -> Phase {
        Phase::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Replace the current phase.
    pub fn store(&self, phase: Phase) {
        self.0.store(phase.to_bits(), Ordering::Release);
    }
}

impl Default for AtomicPhase {
    fn default() -> Self {
        Self::new(Phase::default())
    }
}
