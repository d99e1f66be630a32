//! Timer reload engine
//!
//! Owns the active reload value and the nominal preload the jitter stepper
//! works around. Every write of the preload registers goes through here.
//!
//! A preload written mid-cycle only reaches the counter at its next reload,
//! so the engine also remembers the value the running cycle started from.
//! Elapsed time is measured against that value.

use crate::error::{DriverError, Result};
use crate::readout::CounterReadout;
use hal::RegisterAccess;
use hal_m99::{M99Registers, MAX_COUNT};

/// Active, running and nominal reload values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadEngine {
    timerval: u32,
    running: u32,
    nominal: u32,
}

impl ReloadEngine {
    /// Creates an engine whose values are all `preload`
    pub fn new(preload: u32) -> Self {
        Self {
            timerval: preload,
            running: preload,
            nominal: preload,
        }
    }

    /// Checks that `value` fits the 24-bit counter and is non-zero
    pub fn validate(value: u32) -> Result<u32> {
        if (1..=MAX_COUNT).contains(&value) {
            Ok(value)
        } else {
            Err(DriverError::ReloadOutOfRange(value))
        }
    }

    /// Returns the active reload value
    pub fn timerval(&self) -> u32 {
        self.timerval
    }

    /// Returns the value the running cycle was loaded with
    pub fn running(&self) -> u32 {
        self.running
    }

    /// Returns the nominal preload
    pub fn nominal(&self) -> u32 {
        self.nominal
    }

    /// Records that the counter reloaded from the preload registers
    ///
    /// Called once per serviced underflow, before anything is measured.
    pub fn promote(&mut self) {
        self.running = self.timerval;
    }

    /// Makes `value` the active reload value and writes the preload
    ///
    /// The counter picks it up at its next reload; the running cycle keeps
    /// its value until [`promote`](Self::promote). Callers hold the
    /// interrupt mask.
    pub fn load<A: RegisterAccess>(&mut self, regs: &mut M99Registers<A>, value: u32) {
        self.timerval = value;
        regs.write_preload(value);
    }

    /// Restarts the timer with `value` as both active and nominal value
    ///
    /// The timer is halted while the preload changes, its status is reset,
    /// and the previous timer control is written back.
    pub fn reprogram<A: RegisterAccess>(&mut self, regs: &mut M99Registers<A>, value: u32) {
        self.nominal = value;
        let control = regs.timer_control();
        regs.set_timer_control(control.halted());
        self.load(regs, value);
        self.running = value;
        regs.reset_status();
        regs.set_timer_control(control);
    }

    /// Returns the ticks elapsed since the counter last reloaded
    ///
    /// Measured against the running cycle's value, so a preload written for
    /// the next cycle does not skew it.
    pub fn elapsed<A: RegisterAccess>(
        &self,
        regs: &mut M99Registers<A>,
        readout: &CounterReadout,
    ) -> Result<u32> {
        let counter = readout.read(regs)?;
        Ok(self.running.wrapping_sub(counter))
    }
}
