//! Live accelerometer and gyroscope gauges for motion capture sources.
//!
//! The binary wires these modules together: [`config`] and [`cli`] decide
//! which [`capture`] source to open, [`monitor`] polls it and [`display`]
//! draws each sample with the [`gauge`] formatter.

pub mod capture;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod gauge;
pub mod logging;
pub mod monitor;

pub use error::{AppError, CaptureError, Result};
