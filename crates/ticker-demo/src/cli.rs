#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually. Supports environment variable overrides via the
//! `TICKER_DEMO_*` prefix; explicit flags win over the environment.

use std::env;
use std::process;
use std::time::Duration;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Ticker Demo: a value label next to a once-per-period counter

USAGE:
    ticker-demo [OPTIONS]

OPTIONS:
    --period-ms=N         Tick period in milliseconds (default: 1000)
    --exit-after-ms=N     Quit after N milliseconds (default: 0, disabled)
    --exit-after-ticks=N  Quit after N delivered ticks (default: 0, disabled)
    --headless            Print one line per widget per frame, no raw mode
    --log-file=PATH       Write logs to PATH
    --help, -h            Show this help message
    --version, -V         Show version

KEYBINDINGS:
    space / m             Toggle the counter (unmount, or mount a fresh one)
    p                     Set the label to its preset value
    q / Esc / Ctrl+C      Quit

ENVIRONMENT VARIABLES:
    TICKER_DEMO_PERIOD_MS         Override --period-ms
    TICKER_DEMO_EXIT_AFTER_MS     Override --exit-after-ms
    TICKER_DEMO_EXIT_AFTER_TICKS  Override --exit-after-ticks
    TICKER_DEMO_HEADLESS          Headless output (1/true to enable)
    TICKER_DEMO_LOG_FILE          Override --log-file
    TICKER_LOG                    Log filter directives (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Tick period in milliseconds.
    pub period_ms: u64,
    /// Auto-exit after this many milliseconds (0 = disabled).
    pub exit_after_ms: u64,
    /// Auto-exit after this many ticks (0 = disabled).
    pub exit_after_ticks: u64,
    /// Force headless output even on a terminal.
    pub headless: bool,
    /// Log file path.
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            exit_after_ms: 0,
            exit_after_ticks: 0,
            headless: false,
            log_file: None,
        }
    }
}

fn is_truthy(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn parse_number(flag: &'static str, val: &str) -> Result<u64, ParseError> {
    val.parse().map_err(|_| ParseError::InvalidValue {
        flag,
        value: val.to_string(),
    })
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Prints help or version and exits when asked; exits with status 1 on
    /// invalid input.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("ticker-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment first; unparsable values are ignored.
        if let Some(val) = get_env("TICKER_DEMO_PERIOD_MS")
            && let Ok(n) = val.trim().parse()
        {
            opts.period_ms = n;
        }
        if let Some(val) = get_env("TICKER_DEMO_EXIT_AFTER_MS")
            && let Ok(n) = val.trim().parse()
        {
            opts.exit_after_ms = n;
        }
        if let Some(val) = get_env("TICKER_DEMO_EXIT_AFTER_TICKS")
            && let Ok(n) = val.trim().parse()
        {
            opts.exit_after_ticks = n;
        }
        if let Some(val) = get_env("TICKER_DEMO_HEADLESS") {
            opts.headless = is_truthy(val.trim());
        }
        if let Some(val) = get_env("TICKER_DEMO_LOG_FILE")
            && !val.trim().is_empty()
        {
            opts.log_file = Some(val);
        }

        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--headless" => opts.headless = true,
                other => {
                    if let Some(val) = other.strip_prefix("--period-ms=") {
                        opts.period_ms = parse_number("--period-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        opts.exit_after_ms = parse_number("--exit-after-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--exit-after-ticks=") {
                        opts.exit_after_ticks = parse_number("--exit-after-ticks", val)?;
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        if val.trim().is_empty() {
                            return Err(ParseError::InvalidValue {
                                flag: "--log-file",
                                value: val.to_string(),
                            });
                        }
                        opts.log_file = Some(val.to_string());
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Wall-clock limit, if enabled.
    #[must_use]
    pub fn exit_after(&self) -> Option<Duration> {
        (self.exit_after_ms > 0).then(|| Duration::from_millis(self.exit_after_ms))
    }

    /// Tick limit, if enabled.
    #[must_use]
    pub fn exit_after_ticks(&self) -> Option<u64> {
        (self.exit_after_ticks > 0).then_some(self.exit_after_ticks)
    }
}
