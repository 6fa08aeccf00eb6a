//! Headless runs of the demo screen.

use std::time::Duration;

use ticker_demo::app::{DemoScreen, program_config};
use ticker_demo::cli::Opts;
use ticker_runtime::{OutputMode, Program, ProgramError};

fn run(opts: &Opts) -> (Result<ticker_runtime::RunSummary, ProgramError>, Vec<String>) {
    let mut out = Vec::new();
    let config =
        program_config(opts, OutputMode::Headless).with_poll_timeout(Duration::from_millis(5));
    let result = Program::with_writer(DemoScreen::new(opts.period()), config, &mut out).run();
    let lines = String::from_utf8_lossy(&out)
        .lines()
        .map(str::to_owned)
        .collect();
    (result, lines)
}

#[test]
fn label_and_counter_run_to_tick_limit() {
    let opts = Opts {
        period_ms: 5,
        exit_after_ms: 10_000,
        exit_after_ticks: 4,
        ..Opts::default()
    };
    let (result, lines) = run(&opts);
    let summary = result.unwrap();

    assert_eq!(summary.ticks, 4);
    assert_eq!(lines.len() as u64, summary.frames * 2);
    assert_eq!(&lines[..2], ["Value: 0", "Count: 0"]);
    assert_eq!(&lines[lines.len() - 2..], ["Value: 0", "Count: 4"]);
}

#[test]
fn slow_period_stops_on_time_limit() {
    let opts = Opts {
        period_ms: 60_000,
        exit_after_ms: 30,
        ..Opts::default()
    };
    let (result, lines) = run(&opts);

    assert_eq!(result.unwrap().ticks, 0);
    assert_eq!(lines, ["Value: 0", "Count: 0"]);
}

#[test]
fn zero_period_is_reported() {
    let opts = Opts {
        period_ms: 0,
        exit_after_ms: 1_000,
        ..Opts::default()
    };
    let (result, lines) = run(&opts);

    let err = result.unwrap_err();
    assert!(matches!(err, ProgramError::Mount(_)));
    assert_eq!(
        err.to_string(),
        "failed to mount ticker: periodic callback period must be non-zero"
    );
    assert!(lines.is_empty());
}
