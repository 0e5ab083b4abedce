//! Command: print version information.

/// Version string: the build-time `SIGNAL_VERSION` if set, otherwise the
/// crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("SIGNAL_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("traffic-signal {}", version());
}
