//! # Jitter Stepper
//!
//! Perturbs the reload value once per interrupt so that interrupt spacing
//! sweeps between half and twice the nominal preload.
//!
//! ## Zones
//!
//! With current reload `t` and nominal preload `p`:
//!
//! - `t >= 2p - 1`: head for `p / 2`
//! - `t <= p / 2 + 1`: head for `2p`
//! - otherwise keep the direction of the last step (down if there was none)
//!
//! Each step covers half the remaining distance to the target, so the reload
//! value never leaves `[p / 2, 2p]` once inside it. Targets are clamped to
//! the 24-bit counter.

use hal_m99::MAX_COUNT;

/// Jitter mode state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JitterStepper {
    enabled: bool,
    last_step: Option<i32>,
}

impl JitterStepper {
    /// Creates a stepper, on or off
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_step: None,
        }
    }

    /// Returns true if jitter mode is on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switches jitter mode and forgets the last step
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.last_step = None;
    }

    /// Forgets the last step
    pub fn reset(&mut self) {
        self.last_step = None;
    }

    /// Returns the last step taken
    pub fn last_step(&self) -> Option<i32> {
        self.last_step
    }

    /// Takes one step from `current` around `nominal`, returning the new reload value
    pub fn next_reload(&mut self, current: u32, nominal: u32) -> u32 {
        let t = i64::from(current);
        let p = i64::from(nominal);
        let low = p >> 1;
        let high = (p << 1).min(i64::from(MAX_COUNT));

        let target = if t >= (p << 1) - 1 {
            low
        } else if t <= low + 1 {
            high
        } else if self.last_step.is_some_and(|step| step > 0) {
            high
        } else {
            low
        };

        let step = (target - t) / 2;
        self.last_step = Some(step as i32);
        (t + step) as u32
    }
}
