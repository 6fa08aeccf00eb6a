#![forbid(unsafe_code)]

//! Ticker demo binary entry point.

use std::io::{self, IsTerminal};

use ticker_demo::app::{DemoScreen, program_config};
use ticker_demo::cli;
use ticker_demo::logging::{self, LogTarget};
use ticker_runtime::{OutputMode, Program};
use tracing::info;

fn main() {
    let opts = cli::Opts::parse();

    let mode = if opts.headless || !io::stdout().is_terminal() {
        OutputMode::Headless
    } else {
        OutputMode::Interactive
    };

    let target = LogTarget::resolve(opts.log_file.as_deref(), mode);
    if let Err(e) = logging::init_tracing(&target) {
        eprintln!("Failed to open log file: {e}");
        std::process::exit(1);
    }

    let mut program = Program::new(DemoScreen::new(opts.period()), program_config(&opts, mode));
    match program.run() {
        Ok(summary) => {
            info!(ticks = summary.ticks, frames = summary.frames, "demo exited");
        }
        Err(e) => {
            eprintln!("Runtime error: {e}");
            std::process::exit(1);
        }
    }
}
