//! End-to-end runs of the headless program with real timer threads.

use std::time::Duration;

use ticker_core::{MountError, ScheduleError};
use ticker_runtime::{
    Host, Program, ProgramConfig, ProgramError, Screen, ThreadScheduler, ThreadSchedulerConfig,
};
use ticker_widgets::{Ticker, ValueLabel};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

struct Counter {
    period: Duration,
}

impl Screen for Counter {
    fn init(&mut self, host: &mut Host<ThreadScheduler>) -> Result<(), MountError> {
        host.mount(Ticker::new().with_period(self.period))?;
        Ok(())
    }
}

struct LabelAndCounter;

impl Screen for LabelAndCounter {
    fn init(&mut self, host: &mut Host<ThreadScheduler>) -> Result<(), MountError> {
        host.mount(ValueLabel::new())?;
        host.mount(Ticker::new().with_period(Duration::from_millis(5)))?;
        Ok(())
    }
}

fn config() -> ProgramConfig {
    ProgramConfig::default()
        .headless()
        .with_poll_timeout(Duration::from_millis(5))
        .with_exit_after(Duration::from_secs(10))
}

fn lines(out: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(out)
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
fn three_ticks_end_on_count_three() {
    init_tracing();
    let mut out = Vec::new();
    let screen = Counter {
        period: Duration::from_millis(5),
    };
    let summary = Program::with_writer(screen, config().with_exit_after_ticks(3), &mut out)
        .run()
        .unwrap();

    assert_eq!(summary.ticks, 3);
    let lines = lines(&out);
    assert_eq!(lines.first().map(String::as_str), Some("Count: 0"));
    assert_eq!(lines.last().map(String::as_str), Some("Count: 3"));
    assert_eq!(summary.frames as usize, lines.len());
}

#[test]
fn frames_list_every_mounted_widget() {
    init_tracing();
    let mut out = Vec::new();
    let summary = Program::with_writer(LabelAndCounter, config().with_exit_after_ticks(2), &mut out)
        .run()
        .unwrap();

    let lines = lines(&out);
    assert_eq!(lines.len() as u64, summary.frames * 2);
    assert_eq!(&lines[..2], ["Value: 0", "Count: 0"]);
    assert_eq!(&lines[lines.len() - 2..], ["Value: 0", "Count: 2"]);
}

#[test]
fn zero_period_fails_the_run() {
    init_tracing();
    let mut out = Vec::new();
    let screen = Counter {
        period: Duration::ZERO,
    };
    let err = Program::with_writer(screen, config(), &mut out)
        .run()
        .unwrap_err();

    match err {
        ProgramError::Mount(err) => {
            assert_eq!(err, MountError::schedule("ticker", ScheduleError::InvalidPeriod));
        }
        other => panic!("expected mount error, got {other:?}"),
    }
    assert!(out.is_empty());
}

#[test]
fn timer_limit_fails_the_run() {
    init_tracing();
    let mut out = Vec::new();
    let mut config = config();
    config.scheduler = ThreadSchedulerConfig::default().with_max_timers(0);
    let screen = Counter {
        period: Duration::from_millis(5),
    };
    let err = Program::with_writer(screen, config, &mut out)
        .run()
        .unwrap_err();

    assert!(matches!(
        err,
        ProgramError::Mount(MountError::Schedule {
            source: ScheduleError::Exhausted { limit: 0 },
            ..
        })
    ));
}

#[test]
fn time_limit_stops_a_slow_ticker() {
    init_tracing();
    let mut out = Vec::new();
    let config = config().with_exit_after(Duration::from_millis(40));
    let screen = Counter {
        period: Duration::from_secs(60),
    };
    let summary = Program::with_writer(screen, config, &mut out).run().unwrap();

    assert_eq!(summary.ticks, 0);
    assert_eq!(lines(&out), ["Count: 0"]);
}
