//! # Simulated M99 Module
//!
//! A counting MC68230 timer and 128 bytes of SRAM behind
//! [`RegisterAccess`].
//!
//! ## Timer Model
//!
//! - Setting the enable bit in timer control loads the counter from the
//!   preload registers
//! - While enabled, each tick decrements the counter; reaching zero sets the
//!   zero-detect status bit and reloads from the preload (minimum 1)
//! - Writing timer status clears the bits written as ones
//! - The interrupt line is asserted while zero-detect is set and timer
//!   control has both enable and interrupt-enable set
//!
//! Preload writes take effect at the next reload, as on the real part.
//!
//! [`SimBoard`] is a cheap handle: clones share one module, so a test keeps a
//! handle while the driver owns another.

use crate::fault_injection::{CounterFaultInjector, CounterFaultPlan};
use hal::RegisterAccess;
use hal_m99::registers::offsets;
use hal_m99::{TimerControl, MAX_COUNT};
use spin::Mutex;
use std::sync::Arc;

/// Zero-detect bit in timer status
const ZERO_DETECT: u8 = 0x01;

#[derive(Debug)]
struct BoardState {
    /// Whole window, one entry per 16-bit word
    words: [u16; 0x80],
    counter: u32,
    status: u8,
    underflows: u64,
    led_history: Vec<u8>,
    faults: CounterFaultInjector,
}

impl BoardState {
    fn new() -> Self {
        Self {
            words: [0; 0x80],
            counter: 0,
            status: 0,
            underflows: 0,
            led_history: Vec::new(),
            faults: CounterFaultInjector::default(),
        }
    }

    fn byte(&self, offset: usize) -> u8 {
        (self.words[offset / 2] & 0xFF) as u8
    }

    fn preload(&self) -> u32 {
        u32::from_le_bytes([
            self.byte(offsets::CPL),
            self.byte(offsets::CPM),
            self.byte(offsets::CPH),
            0,
        ])
    }

    fn control(&self) -> TimerControl {
        TimerControl::from_bits(self.byte(offsets::TC))
    }

    fn tick(&mut self, mut ticks: u64) {
        if !self.control().is_running() {
            return;
        }
        while ticks > 0 {
            if self.counter == 0 {
                self.counter = self.preload().max(1);
            }
            let counter = u64::from(self.counter);
            if ticks < counter {
                self.counter -= ticks as u32;
                return;
            }
            ticks -= counter;
            self.counter = self.preload().max(1);
            self.status |= ZERO_DETECT;
            self.underflows += 1;
        }
    }

    fn read_counter_byte(&mut self, offset: usize) -> u16 {
        let [low, mid, high, _] = self.counter.to_le_bytes();
        let value = match offset {
            offsets::CNTL => self.faults.low_override().unwrap_or(low),
            offsets::CNTM => mid,
            _ => high,
        };
        let injected = self.faults.after_read();
        self.tick(u64::from(injected));
        u16::from(value)
    }

    fn write_control(&mut self, value: u16) {
        let was_running = self.control().is_running();
        self.words[offsets::TC / 2] = value & 0xFF;
        if !was_running && self.control().is_running() {
            self.counter = self.preload() & MAX_COUNT;
        }
    }
}

/// Simulated M99 module
///
/// # Examples
///
/// ```
/// use hal::RegisterAccess;
/// use sim_hw::SimBoard;
///
/// let mut board = SimBoard::new();
/// board.write_d16(0xAA, 100); // preload low
/// board.write_d16(0xA0, 0xA1); // counting, interrupt enabled
///
/// board.advance_ticks(99);
/// assert!(!board.irq_asserted());
/// board.advance_ticks(1);
/// assert!(board.irq_asserted());
/// ```
#[derive(Debug, Clone)]
pub struct SimBoard {
    state: Arc<Mutex<BoardState>>,
}

impl SimBoard {
    /// Creates a module with zeroed registers and SRAM
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::new())),
        }
    }

    /// Advances the timer by `ticks`
    ///
    /// Has no effect while the counter is halted.
    pub fn advance_ticks(&self, ticks: u64) {
        self.state.lock().tick(ticks);
    }

    /// Returns true while the interrupt line is asserted
    pub fn irq_asserted(&self) -> bool {
        let state = self.state.lock();
        let control = state.control();
        state.status & ZERO_DETECT != 0 && control.is_running() && control.irq_enabled()
    }

    /// Returns the current counter value
    pub fn counter(&self) -> u32 {
        self.state.lock().counter
    }

    /// Returns the value held in the preload registers
    pub fn preload(&self) -> u32 {
        self.state.lock().preload()
    }

    /// Returns the timer control register
    pub fn timer_control(&self) -> TimerControl {
        self.state.lock().control()
    }

    /// Returns the timer status register
    pub fn status(&self) -> u8 {
        self.state.lock().status
    }

    /// Returns the number of times the counter reached zero
    pub fn underflows(&self) -> u64 {
        self.state.lock().underflows
    }

    /// Returns the current port A (LED) pattern
    pub fn leds(&self) -> u8 {
        self.state.lock().byte(offsets::PAD)
    }

    /// Returns every pattern written to port A, oldest first
    pub fn led_history(&self) -> Vec<u8> {
        self.state.lock().led_history.clone()
    }

    /// Returns the register byte at `offset`
    pub fn register(&self, offset: usize) -> u8 {
        self.state.lock().byte(offset)
    }

    /// Returns the SRAM word at byte `offset`
    pub fn sram_word(&self, offset: usize) -> u16 {
        self.state.lock().words[(offsets::SRAM_BASE + offset) / 2]
    }

    /// Sets the SRAM word at byte `offset`, bypassing the driver
    pub fn set_sram_word(&self, offset: usize, value: u16) {
        self.state.lock().words[(offsets::SRAM_BASE + offset) / 2] = value;
    }

    /// Returns all SRAM as bytes, words big-endian
    pub fn sram_bytes(&self) -> Vec<u8> {
        let state = self.state.lock();
        state.words[..offsets::SRAM_SIZE / 2]
            .iter()
            .flat_map(|word| word.to_be_bytes())
            .collect()
    }

    /// Replaces the counter fault plan, restarting read numbering
    pub fn install_faults(&self, plan: CounterFaultPlan) {
        self.state.lock().faults = CounterFaultInjector::new(plan);
    }

    /// Returns the number of counter byte reads since faults were installed
    pub fn counter_reads(&self) -> usize {
        self.state.lock().faults.reads()
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterAccess for SimBoard {
    fn read_d16(&mut self, offset: usize) -> u16 {
        let mut state = self.state.lock();
        match offset {
            offsets::CNTL | offsets::CNTM | offsets::CNTH => state.read_counter_byte(offset),
            offsets::TS => u16::from(state.status),
            _ => state.words[offset / 2],
        }
    }

    fn write_d16(&mut self, offset: usize, value: u16) {
        let mut state = self.state.lock();
        match offset {
            offsets::TC => state.write_control(value),
            offsets::TS => state.status &= !((value & 0xFF) as u8),
            offsets::CNTL | offsets::CNTM | offsets::CNTH => {}
            offsets::PAD => {
                state.words[offset / 2] = value & 0xFF;
                state.led_history.push((value & 0xFF) as u8);
            }
            _ => state.words[offset / 2] = value,
        }
    }
}
