#![forbid(unsafe_code)]

//! Runtime: schedulers, widget host, and the terminal loop.
//!
//! # Role in Ticker
//! `ticker-runtime` implements the scheduling facility declared in
//! `ticker-core` and drives widgets through their lifecycle.
//!
//! # Primary responsibilities
//! - **CallbackRegistry**: token allocation and the liveness check that backs
//!   the "no tick after cancel" guarantee.
//! - **ManualScheduler**: virtual time for deterministic tests.
//! - **ThreadScheduler**: wall-clock timers whose firings are dispatched on
//!   the host thread.
//! - **Host**: mount/unmount pairing and rendering.
//! - **Program**: the interactive or headless terminal loop.

pub mod host;
pub mod manual;
pub mod program;
pub mod registry;
pub mod thread_scheduler;

pub use host::{Host, WidgetId};
pub use manual::ManualScheduler;
pub use program::{
    Control, OutputMode, Program, ProgramConfig, ProgramError, RunSummary, Screen, is_quit_key,
};
pub use registry::CallbackRegistry;
pub use thread_scheduler::{ThreadScheduler, ThreadSchedulerConfig};

// Key types used by `Screen::handle_key`.
pub use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
