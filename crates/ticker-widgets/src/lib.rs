#![forbid(unsafe_code)]

//! Widgets built on the `ticker-core` lifecycle.
//!
//! - [`Ticker`]: counts once per period while mounted.
//! - [`ValueLabel`]: shows a single integer held in local state.

pub mod ticker;
pub mod value_label;

pub use ticker::{DEFAULT_PERIOD, Ticker};
pub use value_label::{PRESET_VALUE, ValueLabel};
