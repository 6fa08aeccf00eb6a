#![forbid(unsafe_code)]

//! Wall-clock scheduler backed by one timer thread per registration.
//!
//! Timer threads never touch callbacks or widget state. Each one sleeps until
//! its next deadline and posts its token on a channel. The host thread drains
//! the channel ([`ThreadScheduler::dispatch_pending`] /
//! [`ThreadScheduler::wait_and_dispatch`]) and invokes callbacks itself, so
//! callbacks are serialized with every other host operation.
//!
//! # Cancellation
//!
//! `cancel_periodic` removes the registry entry first and then stops and
//! joins the timer thread. A firing that was already queued is discarded at
//! dispatch because the registry no longer knows its token. This is what makes
//! "no tick after unmount" hold even though the timer runs on another thread.
//!
//! # Drift
//!
//! Deadlines are computed as `start + n * period`, not by sleeping `period`
//! after each firing, so a slow host delays firings but does not shift the
//! schedule. Missed deadlines are delivered back to back.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ticker_core::{PeriodicScheduler, ScheduleError, TickCallback, TimerToken};
use tracing::{debug, trace, warn};

use crate::registry::CallbackRegistry;

/// Configuration for [`ThreadScheduler`].
#[derive(Debug, Clone)]
pub struct ThreadSchedulerConfig {
    /// Maximum number of live registrations (and therefore timer threads).
    pub max_timers: usize,
    /// Prefix for timer thread names; the token id is appended.
    pub thread_name_prefix: String,
}

impl Default for ThreadSchedulerConfig {
    fn default() -> Self {
        Self {
            max_timers: 64,
            thread_name_prefix: "ticker-timer".into(),
        }
    }
}

impl ThreadSchedulerConfig {
    /// Set the registration limit.
    #[must_use]
    pub fn with_max_timers(mut self, max_timers: usize) -> Self {
        self.max_timers = max_timers;
        self
    }
}

struct TimerThread {
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl TimerThread {
    fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A [`PeriodicScheduler`] that fires on real time.
pub struct ThreadScheduler {
    config: ThreadSchedulerConfig,
    registry: CallbackRegistry,
    timers: RefCell<HashMap<TimerToken, TimerThread>>,
    fire_tx: mpsc::Sender<TimerToken>,
    fire_rx: mpsc::Receiver<TimerToken>,
    shut_down: Cell<bool>,
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadScheduler {
    /// Create a scheduler with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ThreadSchedulerConfig::default())
    }

    /// Create a scheduler with the given configuration.
    #[must_use]
    pub fn with_config(config: ThreadSchedulerConfig) -> Self {
        let (fire_tx, fire_rx) = mpsc::channel();
        Self {
            config,
            registry: CallbackRegistry::new(),
            timers: RefCell::new(HashMap::new()),
            fire_tx,
            fire_rx,
            shut_down: Cell::new(false),
        }
    }

    /// Number of live registrations.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Deliver already-queued firings without blocking, at most `max`.
    ///
    /// Returns the number of callbacks invoked. Stray firings for cancelled
    /// tokens are discarded and do not count against `max`.
    pub fn dispatch_pending(&self, max: usize) -> usize {
        let mut delivered = 0;
        while delivered < max {
            let Ok(token) = self.fire_rx.try_recv() else {
                break;
            };
            if self.registry.fire(token) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Block up to `timeout` for the next firing, then drain the queue.
    ///
    /// Returns the number of callbacks invoked, at most `max`.
    pub fn wait_and_dispatch(&self, timeout: Duration, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        match self.fire_rx.recv_timeout(timeout) {
            Ok(token) => {
                let first = usize::from(self.registry.fire(token));
                first + self.dispatch_pending(max - first)
            }
            Err(_) => 0,
        }
    }

    /// Cancel every registration and refuse new ones.
    pub fn shutdown(&self) {
        if self.shut_down.replace(true) {
            return;
        }
        self.registry.clear();
        let timers: Vec<TimerThread> = self.timers.borrow_mut().drain().map(|(_, t)| t).collect();
        let stopped = timers.len();
        for timer in timers {
            timer.stop();
        }
        debug!(stopped, "thread scheduler shut down");
    }
}

impl PeriodicScheduler for ThreadScheduler {
    fn register_periodic(
        &self,
        callback: TickCallback,
        period: Duration,
    ) -> Result<TimerToken, ScheduleError> {
        if self.shut_down.get() {
            return Err(ScheduleError::Shutdown);
        }
        if period.is_zero() {
            return Err(ScheduleError::InvalidPeriod);
        }
        let limit = self.config.max_timers;
        if self.registry.len() >= limit {
            warn!(limit, "timer registration refused: capacity exhausted");
            return Err(ScheduleError::Exhausted { limit });
        }

        let token = self.registry.insert(callback);
        let (stop_tx, stop_rx) = mpsc::channel();
        let fire_tx = self.fire_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", self.config.thread_name_prefix, token.raw()))
            .spawn(move || timer_loop(token, period, &stop_rx, &fire_tx));

        match spawned {
            Ok(handle) => {
                self.timers.borrow_mut().insert(
                    token,
                    TimerThread {
                        stop_tx,
                        handle: Some(handle),
                    },
                );
                let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
                debug!(%token, period_ms, "timer thread started");
                Ok(token)
            }
            Err(err) => {
                self.registry.remove(token);
                warn!(%token, error = %err, "failed to spawn timer thread");
                Err(ScheduleError::Spawn(err.to_string()))
            }
        }
    }

    fn cancel_periodic(&self, token: TimerToken) {
        let was_live = self.registry.remove(token);
        let timer = self.timers.borrow_mut().remove(&token);
        if let Some(timer) = timer {
            timer.stop();
        }
        if was_live {
            debug!(%token, "timer thread stopped");
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("shut_down", &self.shut_down.get())
            .finish()
    }
}

fn timer_loop(
    token: TimerToken,
    period: Duration,
    stop_rx: &mpsc::Receiver<()>,
    fire_tx: &mpsc::Sender<TimerToken>,
) {
    let start = Instant::now();
    let mut n: u32 = 1;
    loop {
        let Some(deadline) = start.checked_add(period.saturating_mul(n)) else {
            return;
        };
        let wait = deadline.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {
                if fire_tx.send(token).is_err() {
                    return;
                }
                trace!(%token, n, "timer fired");
                n = n.saturating_add(1);
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
