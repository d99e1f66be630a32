//! Counter readout
//!
//! The counter keeps running while its three bytes are read one at a time.
//! Reading low, mid, high and then low again detects a borrow out of the
//! low byte between the reads: the down-counter's low byte only grows when
//! it wraps.

use crate::error::{DriverError, Result};
use hal::RegisterAccess;
use hal_m99::{CounterSnapshot, M99Registers};

/// Consistent 24-bit counter reads
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterReadout {
    retry_limit: Option<u32>,
}

impl CounterReadout {
    /// Creates a readout giving up after `retry_limit` retries, or never
    pub fn new(retry_limit: Option<u32>) -> Self {
        Self { retry_limit }
    }

    /// Reads the counter
    pub fn read<A: RegisterAccess>(&self, regs: &mut M99Registers<A>) -> Result<u32> {
        let mut retries = 0u32;
        loop {
            let low = regs.counter_low();
            let mid = regs.counter_mid();
            let high = regs.counter_high();
            if regs.counter_low() <= low {
                return Ok(CounterSnapshot { high, mid, low }.value());
            }

            retries += 1;
            if let Some(limit) = self.retry_limit {
                if retries > limit {
                    return Err(DriverError::CounterUnstable(limit));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_m99::registers::offsets;
    use hal_m99::FakeRegisterAccess;
    use sim_hw::{CounterFault, CounterFaultPlan, SimBoard};

    fn running_board(preload: u32) -> SimBoard {
        let mut regs = M99Registers::new(SimBoard::new());
        regs.write_preload(preload);
        regs.set_timer_control(hal_m99::TimerControl::IRQ_DISABLED);
        regs.into_inner()
    }

    #[test]
    fn test_consistent_read() {
        let mut access = FakeRegisterAccess::new();
        access.script_reads(&[
            (offsets::CNTL, 0x90),
            (offsets::CNTM, 0xD0),
            (offsets::CNTH, 0x03),
            (offsets::CNTL, 0x8F),
        ]);
        let mut regs = M99Registers::new(access);

        assert_eq!(CounterReadout::default().read(&mut regs), Ok(0x03_D0_90));
        assert_eq!(regs.access().remaining_reads(), 0);
    }

    #[test]
    fn test_retries_when_low_byte_wraps() {
        let board = running_board(0x03_D0_90);
        board.install_faults(
            CounterFaultPlan::new().with_fault(CounterFault::TicksAfterRead { read: 0, ticks: 0x91 }),
        );
        let mut regs = M99Registers::new(board.clone());

        assert_eq!(CounterReadout::default().read(&mut regs), Ok(0x03_CF_FF));
        assert_eq!(board.counter_reads(), 8);
    }

    #[test]
    fn test_retry_limit() {
        let board = running_board(0x1000);
        board.install_faults(CounterFaultPlan::new().with_fault(CounterFault::UnstableLow));
        let mut regs = M99Registers::new(board.clone());

        assert_eq!(
            CounterReadout::new(Some(3)).read(&mut regs),
            Err(DriverError::CounterUnstable(3))
        );
        assert_eq!(board.counter_reads(), 16);
    }
}
