//! Command-line interface definitions.
use clap::{Parser, Subcommand};

use crate::phase::Phase;

/// Top-level CLI entry point for the traffic signal.
#[derive(Parser, Debug)]
#[command(
    name = "traffic-signal",
    about = "Randomized two-phase traffic signal",
    version
)]
pub struct Cli {
    #[allow(missing_docs)]
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[allow(missing_docs)]
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// TOML file with signal timing (missing file means defaults)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Lower bound of the toggle interval in milliseconds
    #[arg(long = "min-cycle-ms", global = true)]
    pub min_cycle_millis: Option<u64>,

    /// Upper bound of the toggle interval in milliseconds
    #[arg(long = "max-cycle-ms", global = true)]
    pub max_cycle_millis: Option<u64>,

    /// Seed for the interval generator (reproducible runs)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Also append all log output to this file
    #[arg(long, global = true)]
    pub log_file: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the signal and report every phase change
    Run(RunOpts),
    /// Block until the signal reaches a phase
    Wait(WaitOpts),
    /// Print version information
    Version,
}

/// Options for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunOpts {
    /// Stop after this many phase changes (runs until Ctrl-C otherwise)
    #[arg(short = 'n', long)]
    pub cycles: Option<u64>,
}

/// Options for the `wait` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct WaitOpts {
    /// Phase to wait for (red, green)
    pub phase: Phase,

    /// Give up after this many milliseconds
    #[arg(short, long = "timeout-ms")]
    pub timeout_millis: Option<u64>,
}
