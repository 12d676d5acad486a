//! Calibration of a microcontroller's internal oscillator against an external reference clock.
//!
//! The engine is split into three stages:
//!
//! 1. [`ClockEdgeWaiter`](edge::ClockEdgeWaiter) polls the reference signal for a level with a
//!    bounded iteration budget.
//!
//! 2. [`DurationMeasurer`](measure::DurationMeasurer) counts a fixed number of reference cycles and
//!    reports how long they took according to the device's own time base, optionally with a
//!    candidate trim value applied for the duration of the measurement.
//!
//! 3. [`Calibrator`](calibrator::Calibrator) binary-searches the trim domain for the value whose
//!    measurement matches the expected duration, then decides whether that value is good enough.
//!
//! All hardware is reached through the traits in [`hal`] and [`persist`], so the whole engine runs
//! against simulated hardware on the host.
#![cfg_attr(not(test), no_std)]


// must come first so the macros are visible in the other modules
#[macro_use]
mod fmt;

pub mod calibrator;
pub mod config;
pub mod edge;
pub mod hal;
pub mod measure;
pub mod persist;


pub use crate::calibrator::{Calibration, CalibrationError, CalibrationResult, Calibrator, SearchRange};
pub use crate::config::{CalibrationConfig, ConfigError, DivisorCorrection};
pub use crate::edge::ClockEdgeWaiter;
pub use crate::hal::{Level, TickSource, TrimRegister};
pub use crate::measure::DurationMeasurer;
pub use crate::persist::{apply_stored, ByteSlots, RedundantByte, RedundantSlot, StoredTrim, TrimStorage};
