#![forbid(unsafe_code)]

//! Periodic callback contract between widgets and the host's timer system.
//!
//! A widget depends on exactly two operations: [`register_periodic`] and
//! [`cancel_periodic`]. Everything else about timing (real clock, virtual
//! clock, threads) is the scheduler's business.
//!
//! # Invariants
//!
//! 1. Tokens are never reused within one scheduler.
//! 2. After `cancel_periodic(token)` returns, the callback registered under
//!    `token` is never invoked again, even if a firing was already queued.
//! 3. Cancelling an unknown or already-cancelled token is a no-op.
//! 4. A zero period is refused with [`ScheduleError::InvalidPeriod`].
//!
//! [`register_periodic`]: PeriodicScheduler::register_periodic
//! [`cancel_periodic`]: PeriodicScheduler::cancel_periodic

use std::fmt;
use std::time::Duration;

/// Callback invoked on every firing of a periodic registration.
///
/// Callbacks run on the host thread, one at a time, so they need not be
/// `Send`.
pub type TickCallback = Box<dyn FnMut()>;

/// Opaque ownership token for a periodic registration.
///
/// Holding the token is the right to cancel the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Wrap a raw token id. Only schedulers should mint tokens.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw token id.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Reasons a scheduler refuses a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The requested period was zero.
    InvalidPeriod,
    /// The scheduler already holds its maximum number of registrations.
    Exhausted { limit: usize },
    /// The backing timer thread could not be started.
    Spawn(String),
    /// The scheduler has been shut down.
    Shutdown,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPeriod => write!(f, "periodic callback period must be non-zero"),
            Self::Exhausted { limit } => {
                write!(f, "timer capacity exhausted ({limit} registrations)")
            }
            Self::Spawn(msg) => write!(f, "failed to start timer thread: {msg}"),
            Self::Shutdown => write!(f, "scheduler is shut down"),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// The host scheduling facility.
///
/// Methods take `&self`: a callback may cancel registrations (including its
/// own) while the scheduler is dispatching, so implementations use interior
/// mutability.
pub trait PeriodicScheduler {
    /// Register `callback` to run every `period` until cancelled.
    fn register_periodic(
        &self,
        callback: TickCallback,
        period: Duration,
    ) -> Result<TimerToken, ScheduleError>;

    /// Cancel the registration owned by `token`.
    fn cancel_periodic(&self, token: TimerToken);
}
