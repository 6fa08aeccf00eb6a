#![forbid(unsafe_code)]

//! The demo screen: a [`ValueLabel`] above a [`Ticker`].
//!
//! Key handling maps straight onto lifecycle operations, so the toggle key
//! exercises mount and unmount of the counter at runtime.

use std::time::Duration;

use ticker_core::MountError;
use ticker_runtime::{
    Control, Host, KeyCode, KeyEvent, OutputMode, ProgramConfig, Screen, ThreadScheduler,
    WidgetId, is_quit_key,
};
use ticker_widgets::{Ticker, ValueLabel};
use tracing::info;

use crate::cli::Opts;

/// Application state for the demo.
#[derive(Debug)]
pub struct DemoScreen {
    period: Duration,
    label: Option<WidgetId>,
    ticker: Option<WidgetId>,
    toggles: u32,
}

impl DemoScreen {
    /// A screen whose counters tick every `period`.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            label: None,
            ticker: None,
            toggles: 0,
        }
    }

    /// The mounted label, if any.
    #[must_use]
    pub fn label(&self) -> Option<WidgetId> {
        self.label
    }

    /// The mounted counter, if any.
    #[must_use]
    pub fn ticker(&self) -> Option<WidgetId> {
        self.ticker
    }

    /// Unmount the counter if mounted, otherwise mount a fresh one.
    pub fn toggle_ticker(&mut self, host: &mut Host<ThreadScheduler>) -> Result<(), MountError> {
        self.toggles += 1;
        match self.ticker.take() {
            Some(id) => {
                let count = host
                    .unmount(id)
                    .and_then(|widget| widget.as_any().downcast_ref::<Ticker>().map(Ticker::count))
                    .unwrap_or_default();
                info!(%id, count, toggles = self.toggles, "counter hidden");
            }
            None => {
                let id = host.mount(Ticker::new().with_period(self.period))?;
                self.ticker = Some(id);
                info!(%id, toggles = self.toggles, "counter shown");
            }
        }
        Ok(())
    }

    /// Set the label to its preset value.
    pub fn apply_preset(&self, host: &mut Host<ThreadScheduler>) {
        if let Some(label) = self.label.and_then(|id| host.get_mut::<ValueLabel>(id)) {
            label.apply_preset();
        }
    }
}

impl Screen for DemoScreen {
    fn init(&mut self, host: &mut Host<ThreadScheduler>) -> Result<(), MountError> {
        self.label = Some(host.mount(ValueLabel::new())?);
        self.ticker = Some(host.mount(Ticker::new().with_period(self.period))?);
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyEvent,
        host: &mut Host<ThreadScheduler>,
    ) -> Result<Control, MountError> {
        if is_quit_key(&key) {
            return Ok(Control::Quit);
        }
        match key.code {
            KeyCode::Char(' ' | 'm') => self.toggle_ticker(host)?,
            KeyCode::Char('p') => self.apply_preset(host),
            _ => {}
        }
        Ok(Control::Continue)
    }
}

/// Program configuration for the parsed options and chosen output mode.
#[must_use]
pub fn program_config(opts: &Opts, mode: OutputMode) -> ProgramConfig {
    let mut config = ProgramConfig {
        mode,
        ..ProgramConfig::default()
    };
    config.exit_after = opts.exit_after();
    config.exit_after_ticks = opts.exit_after_ticks();
    config
}
