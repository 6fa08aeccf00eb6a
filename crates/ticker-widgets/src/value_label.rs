#![forbid(unsafe_code)]

//! Static value label.
//!
//! Holds one integer in local state (initially zero) and renders it as
//! `<div>Value: N</div>`. No timers; the only state changes come from
//! [`ValueLabel::set_value`] and [`ValueLabel::apply_preset`].

use std::any::Any;

use ticker_core::{Invalidator, MountContext, MountError, Node, Widget};
use tracing::debug;

/// Value written by [`ValueLabel::apply_preset`].
pub const PRESET_VALUE: i64 = 9001;

const NAME: &str = "value-label";

/// Displays a single integer.
#[derive(Debug, Default)]
pub struct ValueLabel {
    value: i64,
    invalidator: Option<Invalidator>,
}

impl ValueLabel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `value` instead of zero.
    #[must_use]
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Replace the value and request a re-render if mounted.
    pub fn set_value(&mut self, value: i64) {
        if self.value == value {
            return;
        }
        self.value = value;
        if let Some(invalidator) = &self.invalidator {
            invalidator.request();
        }
        debug!(value, "label value set");
    }

    /// Set the value to [`PRESET_VALUE`].
    pub fn apply_preset(&mut self) {
        self.set_value(PRESET_VALUE);
    }
}

impl Widget for ValueLabel {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_mount(&mut self, ctx: &MountContext<'_>) -> Result<(), MountError> {
        self.invalidator = Some(ctx.invalidator());
        Ok(())
    }

    fn on_unmount(&mut self, _ctx: &MountContext<'_>) {
        self.invalidator = None;
    }

    fn render(&self) -> Node {
        Node::element("div", vec![Node::text(format!("Value: {}", self.value))])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
