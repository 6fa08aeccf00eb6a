#![forbid(unsafe_code)]

//! Virtual-time scheduler for deterministic tests and replays.
//!
//! Time only moves when [`ManualScheduler::advance`] is called. Every firing
//! that falls due inside the advanced window is delivered in strictly
//! increasing time order (ties broken by registration order), one at a time,
//! each completing before the next is looked up. Registrations made or
//! cancelled by a callback take effect for the remainder of the window.
//!
//! [`ManualScheduler::fire`] delivers a single out-of-band firing, which is
//! how tests simulate a stray timer event arriving after cancellation.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use ticker_core::{PeriodicScheduler, ScheduleError, TickCallback, TimerToken};
use tracing::debug;

use crate::registry::CallbackRegistry;

#[derive(Debug, Clone, Copy)]
struct Schedule {
    period: Duration,
    next_due: Duration,
}

#[derive(Debug, Default)]
struct ClockState {
    now: Duration,
    schedules: BTreeMap<TimerToken, Schedule>,
}

/// A [`PeriodicScheduler`] driven by an explicit virtual clock.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    registry: CallbackRegistry,
    clock: RefCell<ClockState>,
    limit: Option<usize>,
}

impl ManualScheduler {
    /// Create a scheduler at virtual time zero with no registration limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse registrations beyond `limit` live timers.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Current virtual time since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    /// Number of live registrations.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether `token` is still registered.
    #[must_use]
    pub fn is_registered(&self, token: TimerToken) -> bool {
        self.registry.contains(token)
    }

    /// Advance virtual time by `by`, delivering every due firing.
    ///
    /// Returns the number of callbacks invoked.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let mut delivered = 0;

        while let Some(token) = self.pop_due(target) {
            if self.registry.fire(token) {
                delivered += 1;
            }
        }

        self.clock.borrow_mut().now = target;
        delivered
    }

    /// Deliver one firing for `token` right now, outside its schedule.
    ///
    /// Returns `false` when the token is no longer registered.
    pub fn fire(&self, token: TimerToken) -> bool {
        self.registry.fire(token)
    }

    /// Find the earliest due schedule, move the clock to it, and re-arm it.
    fn pop_due(&self, target: Duration) -> Option<TimerToken> {
        let mut clock = self.clock.borrow_mut();
        let (token, due) = clock
            .schedules
            .iter()
            .filter(|(_, s)| s.next_due <= target)
            .min_by_key(|(token, s)| (s.next_due, **token))
            .map(|(token, s)| (*token, s.next_due))?;

        clock.now = due;
        if let Some(schedule) = clock.schedules.get_mut(&token) {
            schedule.next_due = due.saturating_add(schedule.period);
        }
        Some(token)
    }
}

impl PeriodicScheduler for ManualScheduler {
    fn register_periodic(
        &self,
        callback: TickCallback,
        period: Duration,
    ) -> Result<TimerToken, ScheduleError> {
        if period.is_zero() {
            return Err(ScheduleError::InvalidPeriod);
        }
        if let Some(limit) = self.limit
            && self.registry.len() >= limit
        {
            return Err(ScheduleError::Exhausted { limit });
        }

        let token = self.registry.insert(callback);
        let mut clock = self.clock.borrow_mut();
        let next_due = clock.now.saturating_add(period);
        clock.schedules.insert(token, Schedule { period, next_due });
        let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        debug!(%token, period_ms, "periodic timer registered");
        Ok(token)
    }

    fn cancel_periodic(&self, token: TimerToken) {
        let removed = self.registry.remove(token);
        self.clock.borrow_mut().schedules.remove(&token);
        if removed {
            debug!(%token, "periodic timer cancelled");
        }
    }
}
