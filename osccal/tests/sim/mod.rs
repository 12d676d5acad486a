//! A deterministic simulation of the calibration hardware.
//!
//! The reference input is a square wave whose level changes every `half_period` polls. The tick
//! source advances by `f(trim) / edge_flips` per reference cycle, `trim` being the trim value
//! active when the cycle begins, so that measuring `edge_flips` cycles yields exactly `f(trim)`.
#![allow(dead_code)]


use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin};
use osccal::{CalibrationConfig, Calibrator, TickSource, TrimRegister};


pub const HALF_PERIOD_POLLS: u64 = 2;
pub const EDGE_TIMEOUT_POLLS: u32 = 8;


/// One reference cycle per millisecond, 500 cycles per measurement.
pub fn config() -> CalibrationConfig {
    CalibrationConfig::new(1_000, 4_000_000, 500)
        .with_edge_timeout(EDGE_TIMEOUT_POLLS)
}


struct SimState {
    mapping: Box<dyn Fn(u8) -> u32>,
    edge_flips: u64,
    trim: u8,
    trim_writes: Vec<u8>,
    polls: u64,
    dead_after: Option<u64>,
    last_level: bool,
    time_units: u64,
}
impl SimState {
    fn poll(&mut self) -> bool {
        let poll = self.polls;
        self.polls += 1;

        let alive = self.dead_after.map_or(true, |dead| poll < dead);
        let level = alive && (poll / HALF_PERIOD_POLLS) % 2 == 1;
        if level && !self.last_level {
            self.time_units += u64::from((self.mapping)(self.trim));
        }
        self.last_level = level;
        level
    }
}


#[derive(Clone)]
pub struct Sim(Rc<RefCell<SimState>>);
impl Sim {
    pub fn new(config: &CalibrationConfig, initial_trim: u8, mapping: impl Fn(u8) -> u32 + 'static) -> Self {
        Self(Rc::new(RefCell::new(SimState {
            mapping: Box::new(mapping),
            edge_flips: u64::from(config.edge_flips()),
            trim: initial_trim,
            trim_writes: Vec::new(),
            polls: 0,
            dead_after: None,
            last_level: false,
            time_units: 0,
        })))
    }

    /// Makes the reference input stay low once `polls` polls have happened in total.
    pub fn kill_signal_after(&self, polls: u64) {
        self.0.borrow_mut().dead_after = Some(polls);
    }

    pub fn calibrator(&self, config: CalibrationConfig) -> Calibrator<SimPin, SimTicks, SimTrim> {
        Calibrator::from_parts(SimPin(self.clone()), SimTicks(self.clone()), SimTrim(self.clone()), config)
            .expect("simulation configuration is valid")
    }

    pub fn trim(&self) -> u8 {
        self.0.borrow().trim
    }

    pub fn polls(&self) -> u64 {
        self.0.borrow().polls
    }

    /// The candidates that were applied, in order (every other write is a restore).
    pub fn candidates(&self) -> Vec<u8> {
        self.0.borrow().trim_writes.iter().step_by(2).copied().collect()
    }

    /// The values written back after each candidate.
    pub fn restores(&self) -> Vec<u8> {
        self.0.borrow().trim_writes.iter().skip(1).step_by(2).copied().collect()
    }

    pub fn measurements(&self) -> usize {
        self.candidates().len()
    }
}


pub struct SimPin(Sim);
impl ErrorType for SimPin {
    type Error = Infallible;
}
impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.0.borrow_mut().poll())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.0.borrow_mut().poll())
    }
}


pub struct SimTicks(Sim);
impl TickSource for SimTicks {
    fn now(&mut self) -> u32 {
        let state = self.0.0.borrow();
        (state.time_units / state.edge_flips) as u32
    }
}


pub struct SimTrim(Sim);
impl TrimRegister for SimTrim {
    fn read(&mut self) -> u8 {
        self.0.0.borrow().trim
    }

    fn write(&mut self, value: u8) {
        let mut state = self.0.0.borrow_mut();
        state.trim = value;
        state.trim_writes.push(value);
    }
}
