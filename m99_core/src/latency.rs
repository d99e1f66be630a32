//! Interrupt latency tracking
//!
//! Latency is the number of ticks the counter has already run past its
//! reload when the interrupt handler reads it.

/// Wire value meaning "no sample yet"
pub const NO_SAMPLE: u32 = u32::MAX;

/// Last and maximum observed latency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyTracker {
    last: Option<u32>,
    max: Option<u32>,
}

impl LatencyTracker {
    /// Creates a tracker with no samples
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one measurement
    pub fn record(&mut self, ticks: u32) {
        self.last = Some(ticks);
        if self.max.map_or(true, |max| ticks > max) {
            self.max = Some(ticks);
        }
    }

    /// Returns the last measurement
    pub fn last(&self) -> Option<u32> {
        self.last
    }

    /// Returns the largest measurement
    pub fn max(&self) -> Option<u32> {
        self.max
    }

    /// Overrides the maximum; `None` clears it
    pub fn set_max(&mut self, max: Option<u32>) {
        self.max = max;
    }
}

/// Encodes an optional sample for the status interface
pub fn to_wire(sample: Option<u32>) -> u32 {
    sample.unwrap_or(NO_SAMPLE)
}

/// Decodes a status interface value
pub fn from_wire(value: u32) -> Option<u32> {
    (value != NO_SAMPLE).then_some(value)
}
