//! Logging infrastructure for structured console and file output.
//!
//! Everything is emitted through [`tracing`].  Two targets get special
//! console treatment:
//!
//! - [`STAGE_TARGET`]: section headers, rendered as `==> message`
//! - [`PHASE_TARGET`]: observed phase changes, rendered with a coloured
//!   phase badge; messages must start with the phase name (`"green: ..."`)

mod subscriber;

pub use subscriber::init_subscriber;

/// Tracing target for stage headers.
pub const STAGE_TARGET: &str = "traffic_signal::stage";

/// Tracing target for phase changes seen by a waiter.
pub const PHASE_TARGET: &str = "traffic_signal::phase";
