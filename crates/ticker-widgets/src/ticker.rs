#![forbid(unsafe_code)]

//! Periodic counter widget.
//!
//! `Ticker` holds a counter that starts at zero and increments once per
//! period while the widget is mounted. It renders as
//! `<header><div>Count: N</div></header>`.
//!
//! # Invariants
//!
//! 1. `timer()` is `Some` iff the widget is active (mounted, not unmounted).
//! 2. Mounting resets the counter to zero; afterwards it only increases, by
//!    exactly one per delivered tick.
//! 3. After `on_unmount` returns, no tick reaches the counter. This is
//!    enforced by cancelling the registration, not by a guard in the tick
//!    path.
//! 4. `render` is a pure function of the counter.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use ticker_core::{Invalidator, MountContext, MountError, Node, Phase, TimerToken, Widget};
use tracing::{debug, trace};

/// Tick period used by [`Ticker::new`].
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1000);

const NAME: &str = "ticker";

/// Counts ticks of a periodic timer while mounted.
#[derive(Debug)]
pub struct Ticker {
    count: Rc<Cell<u64>>,
    period: Duration,
    timer: Option<TimerToken>,
    invalidator: Option<Invalidator>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

/// The tick body shared by [`Ticker::tick`] and the registered callback.
fn record_tick(count: &Cell<u64>, invalidator: Option<&Invalidator>) {
    let next = count.get().saturating_add(1);
    count.set(next);
    if let Some(invalidator) = invalidator {
        invalidator.request();
    }
    trace!(count = next, "tick");
}

impl Ticker {
    /// A ticker with a count of zero and a one-second period.
    #[must_use]
    pub fn new() -> Self {
        Self {
            count: Rc::new(Cell::new(0)),
            period: DEFAULT_PERIOD,
            timer: None,
            invalidator: None,
        }
    }

    /// Use `period` instead of [`DEFAULT_PERIOD`]. Takes effect on mount.
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Ticks delivered since the last mount.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.get()
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// The live timer registration, if active.
    #[must_use]
    pub fn timer(&self) -> Option<TimerToken> {
        self.timer
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.timer.is_some() {
            Phase::Active
        } else {
            Phase::Unmounted
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase() == Phase::Active
    }

    /// Increment the counter and request a re-render.
    ///
    /// This is what the registered timer callback does on every firing.
    /// Only meaningful while active; there is no guard.
    pub fn tick(&self) {
        record_tick(&self.count, self.invalidator.as_ref());
    }
}

impl Widget for Ticker {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_mount(&mut self, ctx: &MountContext<'_>) -> Result<(), MountError> {
        debug_assert!(self.timer.is_none(), "ticker mounted twice without unmount");

        self.count.set(0);
        let invalidator = ctx.invalidator();
        let count = Rc::clone(&self.count);
        let callback_invalidator = invalidator.clone();
        let token = ctx
            .scheduler()
            .register_periodic(
                Box::new(move || record_tick(&count, Some(&callback_invalidator))),
                self.period,
            )
            .map_err(|err| MountError::schedule(NAME, err))?;

        self.timer = Some(token);
        self.invalidator = Some(invalidator);
        debug!(
            %token,
            period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX),
            "ticker started"
        );
        Ok(())
    }

    fn on_unmount(&mut self, ctx: &MountContext<'_>) {
        if let Some(token) = self.timer.take() {
            ctx.scheduler().cancel_periodic(token);
            debug!(%token, count = self.count(), "ticker stopped");
        }
        self.invalidator = None;
    }

    fn render(&self) -> Node {
        Node::element(
            "header",
            vec![Node::element(
                "div",
                vec![Node::text(format!("Count: {}", self.count()))],
            )],
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
