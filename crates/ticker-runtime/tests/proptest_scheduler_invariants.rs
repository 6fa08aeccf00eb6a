//! Property-based invariant tests for the virtual-time scheduler and host.
//!
//! **ManualScheduler:**
//! 1. A timer registered at time zero fires exactly `floor(now / period)` times.
//! 2. Firings are observed in non-decreasing virtual time.
//! 3. Splitting an advance into smaller steps never changes what is delivered.
//! 4. A cancelled timer never fires again, including out-of-band firings.
//! 5. Zero periods are always refused.
//!
//! **Host:**
//! 6. Mount then unmount leaves the scheduler with no registrations.

use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use ticker_core::{
    MountContext, MountError, Node, PeriodicScheduler, ScheduleError, TimerToken, Widget,
};
use ticker_runtime::{Host, ManualScheduler};

// ── Strategies ────────────────────────────────────────────────────────────

fn periods_strategy() -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(1u64..=500, 1..=6)
}

fn steps_strategy() -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(0u64..=1_500, 0..=16)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::new("ticker_runtime=debug"))
        .try_init();
}

type FireLog = Rc<RefCell<Vec<(usize, Duration)>>>;

/// Register one timer per period; each firing records its index and the
/// virtual time at which it ran.
fn register_all(sched: &Rc<ManualScheduler>, periods: &[u64]) -> (Vec<TimerToken>, FireLog) {
    let log: FireLog = Rc::new(RefCell::new(Vec::new()));
    let tokens = periods
        .iter()
        .enumerate()
        .map(|(index, period)| {
            let log = Rc::clone(&log);
            let clock: Weak<ManualScheduler> = Rc::downgrade(sched);
            sched
                .register_periodic(
                    Box::new(move || {
                        let now = clock.upgrade().map(|s| s.now()).unwrap_or_default();
                        log.borrow_mut().push((index, now));
                    }),
                    Duration::from_millis(*period),
                )
                .unwrap()
        })
        .collect();
    (tokens, log)
}

fn fires_of(log: &FireLog, index: usize) -> u64 {
    log.borrow().iter().filter(|(i, _)| *i == index).count() as u64
}

proptest! {
    #[test]
    fn fire_counts_follow_elapsed_time(periods in periods_strategy(), steps in steps_strategy()) {
        let sched = Rc::new(ManualScheduler::new());
        let (_tokens, log) = register_all(&sched, &periods);

        for step in &steps {
            sched.advance(Duration::from_millis(*step));
        }

        let elapsed = sched.now().as_millis() as u64;
        for (index, period) in periods.iter().enumerate() {
            prop_assert_eq!(fires_of(&log, index), elapsed / period);
        }
    }

    #[test]
    fn firings_are_time_ordered(periods in periods_strategy(), steps in steps_strategy()) {
        let sched = Rc::new(ManualScheduler::new());
        let (_tokens, log) = register_all(&sched, &periods);

        for step in &steps {
            sched.advance(Duration::from_millis(*step));
        }

        let log = log.borrow();
        for pair in log.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].1);
        }
        for (index, at) in log.iter() {
            prop_assert_eq!(at.as_millis() as u64 % periods[*index], 0);
        }
    }

    #[test]
    fn step_size_does_not_change_delivery(periods in periods_strategy(), steps in steps_strategy()) {
        let stepped = Rc::new(ManualScheduler::new());
        let (_a, stepped_log) = register_all(&stepped, &periods);
        for step in &steps {
            stepped.advance(Duration::from_millis(*step));
        }

        let total: u64 = steps.iter().sum();
        let single = Rc::new(ManualScheduler::new());
        let (_b, single_log) = register_all(&single, &periods);
        single.advance(Duration::from_millis(total));

        prop_assert_eq!(&*stepped_log.borrow(), &*single_log.borrow());
    }

    #[test]
    fn cancelled_timer_stays_silent(
        periods in periods_strategy(),
        before in 0u64..=2_000,
        after in 0u64..=2_000,
        victim in any::<prop::sample::Index>(),
    ) {
        init_tracing();
        let sched = Rc::new(ManualScheduler::new());
        let (tokens, log) = register_all(&sched, &periods);
        let victim = victim.index(tokens.len());

        sched.advance(Duration::from_millis(before));
        let frozen = fires_of(&log, victim);
        sched.cancel_periodic(tokens[victim]);

        sched.advance(Duration::from_millis(after));
        prop_assert!(!sched.fire(tokens[victim]));
        prop_assert_eq!(fires_of(&log, victim), frozen);
        prop_assert_eq!(sched.active_count(), tokens.len() - 1);
    }

    #[test]
    fn zero_period_is_refused(registered in 0usize..4) {
        let sched = Rc::new(ManualScheduler::new());
        let (_tokens, _log) = register_all(&sched, &vec![10; registered]);
        let err = sched
            .register_periodic(Box::new(|| {}), Duration::ZERO)
            .unwrap_err();
        prop_assert_eq!(err, ScheduleError::InvalidPeriod);
        prop_assert_eq!(sched.active_count(), registered);
    }
}

// ── Host ──────────────────────────────────────────────────────────────────

/// Registers one timer per mount and cancels it on unmount.
struct Pulse {
    period_ms: u64,
    timer: Option<TimerToken>,
}

impl Widget for Pulse {
    fn name(&self) -> &'static str {
        "pulse"
    }

    fn on_mount(&mut self, ctx: &MountContext<'_>) -> Result<(), MountError> {
        let token = ctx
            .scheduler()
            .register_periodic(Box::new(|| {}), Duration::from_millis(self.period_ms))
            .map_err(|err| MountError::schedule("pulse", err))?;
        self.timer = Some(token);
        Ok(())
    }

    fn on_unmount(&mut self, ctx: &MountContext<'_>) {
        if let Some(token) = self.timer.take() {
            ctx.scheduler().cancel_periodic(token);
        }
    }

    fn render(&self) -> Node {
        Node::text("pulse")
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

proptest! {
    #[test]
    fn host_unmount_releases_every_timer(
        periods in proptest::collection::vec(1u64..=100, 0..=8),
        advance in 0u64..=1_000,
    ) {
        init_tracing();
        let mut host = Host::new(ManualScheduler::new());
        let ids: Vec<_> = periods
            .iter()
            .map(|period_ms| {
                host.mount(Pulse { period_ms: *period_ms, timer: None }).unwrap()
            })
            .collect();
        prop_assert_eq!(host.scheduler().active_count(), periods.len());

        host.scheduler().advance(Duration::from_millis(advance));
        for id in ids.iter().rev() {
            prop_assert!(host.unmount(*id).is_some());
        }
        prop_assert_eq!(host.scheduler().active_count(), 0);
        prop_assert!(host.is_empty());
    }
}
