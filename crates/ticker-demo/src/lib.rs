#![forbid(unsafe_code)]

//! Terminal demo for Ticker.
//!
//! Shows a [`ticker_widgets::ValueLabel`] above a [`ticker_widgets::Ticker`]
//! and lets the user unmount and remount the counter at runtime.

pub mod app;
pub mod cli;
pub mod logging;
