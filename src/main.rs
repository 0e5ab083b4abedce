//! `traffic-signal` command-line entry point.
use anyhow::Result;
use clap::Parser;

use traffic_signal::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, args.global.log_file.as_deref());

    match args.command {
        cli::Command::Run(opts) => commands::run::run(&args.global, &opts),
        cli::Command::Wait(opts) => commands::wait::run(&args.global, &opts),
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
