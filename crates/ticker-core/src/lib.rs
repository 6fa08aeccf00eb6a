#![forbid(unsafe_code)]

//! Core: timer contract, widget lifecycle, and display tree.
//!
//! # Role in Ticker
//! `ticker-core` is the contract layer. It defines what a widget is, how a
//! widget asks the host for a periodic callback, and what a widget renders.
//! It contains no scheduler and no terminal code.
//!
//! # Primary responsibilities
//! - **PeriodicScheduler**: the two-function timer contract
//!   (`register_periodic` / `cancel_periodic`) and its ownership token.
//! - **Widget**: mount/unmount hooks plus a pure `render`.
//! - **Invalidator**: the explicit "please re-render" handle.
//! - **Node**: the display tree produced by `render`.
//!
//! # How it fits in the system
//! The runtime (`ticker-runtime`) implements the scheduler contract and drives
//! widgets through their lifecycle. Widgets (`ticker-widgets`) only depend on
//! this crate, so they can be exercised against any scheduler.

pub mod lifecycle;
pub mod timer;
pub mod view;

pub use lifecycle::{Invalidator, MountContext, MountError, Phase, Widget};
pub use timer::{PeriodicScheduler, ScheduleError, TickCallback, TimerToken};
pub use view::Node;
