//! Deterministic fault injection for counter readout
//!
//! A real counter keeps running while software reads its three bytes one at
//! a time. These faults reproduce that race on demand.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: Faults fire at fixed read indices, never randomly
//! - **Composable**: A plan holds any number of faults
//! - **Test-focused**: Not intended for production use
//!
//! ## Example
//!
//! ```
//! use sim_hw::fault_injection::{CounterFault, CounterFaultPlan};
//!
//! let plan = CounterFaultPlan::new()
//!     .with_fault(CounterFault::TicksAfterRead { read: 0, ticks: 0x91 });
//! assert_eq!(plan.faults().len(), 1);
//! ```

/// A fault applied while the counter bytes are being read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterFault {
    /// Advance the counter by `ticks` right after counter byte read `read`
    ///
    /// Reads are numbered from 0 across all three counter registers since
    /// the plan was installed.
    TicksAfterRead { read: usize, ticks: u32 },

    /// Every second low-byte read reports a wrap (0x00, then 0xFF)
    UnstableLow,
}

/// A plan describing the counter faults to inject
#[derive(Debug, Clone, Default)]
pub struct CounterFaultPlan {
    faults: Vec<CounterFault>,
}

impl CounterFaultPlan {
    /// Creates an empty plan
    pub fn new() -> Self {
        Self { faults: Vec::new() }
    }

    /// Adds a fault to the plan
    pub fn with_fault(mut self, fault: CounterFault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Returns the faults in the plan
    pub fn faults(&self) -> &[CounterFault] {
        &self.faults
    }
}

/// Applies a plan to the stream of counter reads
#[derive(Debug, Default)]
pub struct CounterFaultInjector {
    plan: CounterFaultPlan,
    reads: usize,
    low_reads: usize,
}

impl CounterFaultInjector {
    /// Creates an injector for `plan`
    pub fn new(plan: CounterFaultPlan) -> Self {
        Self {
            plan,
            reads: 0,
            low_reads: 0,
        }
    }

    /// Returns the value to report for a low-byte read, if overridden
    pub fn low_override(&mut self) -> Option<u8> {
        let index = self.low_reads;
        self.low_reads += 1;
        self.plan
            .faults()
            .contains(&CounterFault::UnstableLow)
            .then(|| if index % 2 == 0 { 0x00 } else { 0xFF })
    }

    /// Records one counter byte read and returns the ticks to inject after it
    pub fn after_read(&mut self) -> u32 {
        let index = self.reads;
        self.reads += 1;
        self.plan
            .faults()
            .iter()
            .map(|fault| match fault {
                CounterFault::TicksAfterRead { read, ticks } if *read == index => *ticks,
                _ => 0,
            })
            .sum()
    }

    /// Returns the number of counter byte reads seen
    pub fn reads(&self) -> usize {
        self.reads
    }
}
