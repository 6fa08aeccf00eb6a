#![forbid(unsafe_code)]

//! Widget host: mounts, unmounts, and renders widgets.
//!
//! The host is the only caller of widget lifecycle hooks, so it is where the
//! mount/unmount pairing is guaranteed. Widgets are kept in mount order and
//! addressed by [`WidgetId`]; ids are never reused.
//!
//! # Redraw protocol
//!
//! Widgets do not render on their own. They call
//! [`Invalidator::request`](ticker_core::Invalidator::request) after a state
//! change; the driver polls [`Host::take_redraw`] and calls
//! [`Host::render_all`] when it returns `true`. Mounting and unmounting also
//! request a redraw.
//!
//! # Teardown
//!
//! Dropping a host unmounts every remaining widget (reverse mount order)
//! before the scheduler itself is dropped, so no registration outlives the
//! widget that owns it.

use std::fmt;

use ticker_core::{
    Invalidator, MountContext, MountError, Node, PeriodicScheduler, Phase, Widget,
};
use tracing::{error, info};

/// Handle to a mounted widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(u64);

impl WidgetId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

struct Mounted {
    id: WidgetId,
    widget: Box<dyn Widget>,
}

/// Owns a scheduler and the widgets mounted against it.
pub struct Host<S: PeriodicScheduler> {
    scheduler: S,
    invalidator: Invalidator,
    mounted: Vec<Mounted>,
    next_id: u64,
}

impl<S: PeriodicScheduler> Host<S> {
    /// Create an empty host around `scheduler`.
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            invalidator: Invalidator::new(),
            mounted: Vec::new(),
            next_id: 1,
        }
    }

    /// The scheduling facility handed to widgets on mount.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// A handle to the host's redraw flag.
    pub fn invalidator(&self) -> Invalidator {
        self.invalidator.clone()
    }

    /// Mount `widget`, making it active.
    ///
    /// On failure the widget is dropped, nothing is registered, and the
    /// error is returned to the caller as a fatal initialization error.
    pub fn mount<W: Widget>(&mut self, widget: W) -> Result<WidgetId, MountError> {
        self.mount_boxed(Box::new(widget))
    }

    /// Mount an already boxed widget.
    pub fn mount_boxed(&mut self, mut widget: Box<dyn Widget>) -> Result<WidgetId, MountError> {
        let name = widget.name();
        {
            let ctx = MountContext::new(&self.scheduler, self.invalidator.clone());
            if let Err(err) = widget.on_mount(&ctx) {
                error!(widget = name, error = %err, "widget mount failed");
                return Err(err);
            }
        }

        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.mounted.push(Mounted { id, widget });
        self.invalidator.request();
        info!(widget = name, %id, "widget mounted");
        Ok(id)
    }

    /// Unmount the widget `id` and hand the instance back.
    ///
    /// Returns `None` if `id` is not mounted.
    pub fn unmount(&mut self, id: WidgetId) -> Option<Box<dyn Widget>> {
        let index = self.mounted.iter().position(|m| m.id == id)?;
        let Mounted { mut widget, .. } = self.mounted.remove(index);
        self.finish_unmount(id, widget.as_mut());
        Some(widget)
    }

    /// Unmount every widget, newest first. Returns how many were unmounted.
    pub fn unmount_all(&mut self) -> usize {
        let mut count = 0;
        while let Some(Mounted { id, mut widget }) = self.mounted.pop() {
            self.finish_unmount(id, widget.as_mut());
            count += 1;
        }
        count
    }

    fn finish_unmount(&self, id: WidgetId, widget: &mut dyn Widget) {
        let ctx = MountContext::new(&self.scheduler, self.invalidator.clone());
        widget.on_unmount(&ctx);
        self.invalidator.request();
        info!(widget = widget.name(), %id, "widget unmounted");
    }

    /// Lifecycle phase of `id` as seen by the host.
    pub fn phase(&self, id: WidgetId) -> Phase {
        if self.is_mounted(id) {
            Phase::Active
        } else {
            Phase::Unmounted
        }
    }

    pub fn is_mounted(&self, id: WidgetId) -> bool {
        self.mounted.iter().any(|m| m.id == id)
    }

    /// Number of mounted widgets.
    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// Ids of mounted widgets in mount order.
    pub fn ids(&self) -> Vec<WidgetId> {
        self.mounted.iter().map(|m| m.id).collect()
    }

    /// Typed access to a mounted widget.
    pub fn get<T: Widget>(&self, id: WidgetId) -> Option<&T> {
        self.mounted
            .iter()
            .find(|m| m.id == id)
            .and_then(|m| m.widget.as_any().downcast_ref::<T>())
    }

    /// Typed mutable access to a mounted widget.
    pub fn get_mut<T: Widget>(&mut self, id: WidgetId) -> Option<&mut T> {
        self.mounted
            .iter_mut()
            .find(|m| m.id == id)
            .and_then(|m| m.widget.as_any_mut().downcast_mut::<T>())
    }

    /// Render one mounted widget.
    pub fn render(&self, id: WidgetId) -> Option<Node> {
        self.mounted
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.widget.render())
    }

    /// Render every mounted widget in mount order.
    pub fn render_all(&self) -> Vec<Node> {
        self.mounted.iter().map(|m| m.widget.render()).collect()
    }

    /// Whether a redraw has been requested since the last [`take_redraw`](Self::take_redraw).
    pub fn needs_redraw(&self) -> bool {
        self.invalidator.is_dirty()
    }

    /// Read and clear the redraw flag.
    pub fn take_redraw(&self) -> bool {
        self.invalidator.take()
    }
}

impl<S: PeriodicScheduler> Drop for Host<S> {
    fn drop(&mut self) {
        self.unmount_all();
    }
}

impl<S: PeriodicScheduler + fmt::Debug> fmt::Debug for Host<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.mounted.iter().map(|m| m.widget.name()).collect();
        f.debug_struct("Host")
            .field("scheduler", &self.scheduler)
            .field("mounted", &names)
            .field("dirty", &self.invalidator.is_dirty())
            .finish()
    }
}
