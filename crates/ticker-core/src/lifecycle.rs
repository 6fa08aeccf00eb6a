#![forbid(unsafe_code)]

//! Widget lifecycle: mount, unmount, render.
//!
//! A widget is a small state machine driven by its host:
//!
//! ```text
//!   Unmounted --on_mount--> Active --on_unmount--> Unmounted
//!                            |  ^
//!                            +--+ tick (data only)
//! ```
//!
//! Resources acquired in `on_mount` (timer registrations) are released in
//! `on_unmount`. The host guarantees the pairing; widgets do not defend
//! against double mounts beyond a `debug_assert!`.
//!
//! State changes do not trigger redraws implicitly. A widget that mutates
//! its state calls [`Invalidator::request`] so the host knows to call
//! `render` again.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::timer::{PeriodicScheduler, ScheduleError};
use crate::view::Node;

/// Lifecycle phase of a widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Not attached to a host (before mount, or after unmount).
    #[default]
    Unmounted,
    /// Attached and allowed to hold timer registrations.
    Active,
}

impl Phase {
    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Active => "active",
        }
    }
}

#[derive(Debug, Default)]
struct InvalidatorState {
    dirty: Cell<bool>,
    requests: Cell<u64>,
}

/// Shared redraw flag between a host and its widgets.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct Invalidator {
    state: Rc<InvalidatorState>,
}

impl Invalidator {
    /// Create a clean (not dirty) invalidator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the host to re-render.
    pub fn request(&self) {
        self.state.dirty.set(true);
        self.state
            .requests
            .set(self.state.requests.get().saturating_add(1));
    }

    /// Whether a redraw is pending.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.get()
    }

    /// Read and clear the pending-redraw flag.
    pub fn take(&self) -> bool {
        self.state.dirty.replace(false)
    }

    /// Total number of redraw requests made through any handle.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.state.requests.get()
    }
}

/// What a widget receives from its host on mount and unmount.
pub struct MountContext<'a> {
    scheduler: &'a dyn PeriodicScheduler,
    invalidator: Invalidator,
}

impl<'a> MountContext<'a> {
    /// Bundle a scheduler and the host's invalidator.
    pub fn new(scheduler: &'a dyn PeriodicScheduler, invalidator: Invalidator) -> Self {
        Self {
            scheduler,
            invalidator,
        }
    }

    /// The host scheduling facility.
    #[must_use]
    pub fn scheduler(&self) -> &'a dyn PeriodicScheduler {
        self.scheduler
    }

    /// A handle to the host's redraw flag.
    #[must_use]
    pub fn invalidator(&self) -> Invalidator {
        self.invalidator.clone()
    }
}

impl fmt::Debug for MountContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountContext")
            .field("invalidator", &self.invalidator)
            .finish_non_exhaustive()
    }
}

/// Fatal errors raised while mounting a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// The scheduling facility refused a periodic registration.
    Schedule {
        widget: &'static str,
        source: ScheduleError,
    },
}

impl MountError {
    /// Wrap a scheduler refusal for `widget`.
    #[must_use]
    pub fn schedule(widget: &'static str, source: ScheduleError) -> Self {
        Self::Schedule { widget, source }
    }
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schedule { widget, source } => {
                write!(f, "failed to mount {widget}: {source}")
            }
        }
    }
}

impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schedule { source, .. } => Some(source),
        }
    }
}

/// A unit of display state and behavior driven by a host.
pub trait Widget: Any {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Called once when the widget becomes active.
    ///
    /// Acquire timer registrations here. An error leaves the widget
    /// unmounted; the host propagates it as an initialization failure.
    fn on_mount(&mut self, _ctx: &MountContext<'_>) -> Result<(), MountError> {
        Ok(())
    }

    /// Called once when the widget is about to be removed.
    ///
    /// Every registration acquired in `on_mount` must be cancelled before
    /// this returns.
    fn on_unmount(&mut self, _ctx: &MountContext<'_>) {}

    /// Produce the display tree for the current state. Must be pure.
    fn render(&self) -> Node;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
