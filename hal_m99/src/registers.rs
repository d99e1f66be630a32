//! # M99 Register Facade
//!
//! Typed access to the module's MC68230 parallel interface/timer and its
//! SRAM, which share one 256-byte address window.
//!
//! ## Layout
//!
//! - `0x00..0x80`: SRAM, 16-bit words stored big-endian
//! - `0x80..0xB6`: MC68230 registers, one byte each in the low half of a word
//!
//! ## Design Notes
//!
//! - All byte splitting and joining of the 24-bit timer registers happens
//!   here; callers only see `u32` counts and whole SRAM words
//! - No locking; the owner serializes access

use hal::RegisterAccess;

/// Byte offsets inside the module window
pub mod offsets {
    /// First SRAM byte
    pub const SRAM_BASE: usize = 0x00;
    /// SRAM size in bytes
    pub const SRAM_SIZE: usize = 0x80;

    /// Port general control
    pub const PGC: usize = 0x80;
    /// Port A data direction
    pub const PADD: usize = 0x84;
    /// Port B data direction
    pub const PBDD: usize = 0x86;
    /// Port A control
    pub const PAC: usize = 0x8C;
    /// Port B control
    pub const PBC: usize = 0x8E;
    /// Port A data (diagnostic LEDs)
    pub const PAD: usize = 0x90;
    /// Port B data
    pub const PBD: usize = 0x92;
    /// Timer control
    pub const TC: usize = 0xA0;
    /// Timer interrupt vector (unused, the module supplies no vector)
    pub const TIV: usize = 0xA2;
    /// Counter preload high
    pub const CPH: usize = 0xA6;
    /// Counter preload middle
    pub const CPM: usize = 0xA8;
    /// Counter preload low
    pub const CPL: usize = 0xAA;
    /// Counter high
    pub const CNTH: usize = 0xAE;
    /// Counter middle
    pub const CNTM: usize = 0xB0;
    /// Counter low
    pub const CNTL: usize = 0xB2;
    /// Timer status
    pub const TS: usize = 0xB4;
}

/// Largest value the 24-bit counter and preload registers hold
pub const MAX_COUNT: u32 = 0x00FF_FFFF;

/// Timer control register value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerControl(u8);

impl TimerControl {
    /// Counter runs
    pub const ENABLE: u8 = 0x01;
    /// Zero detect raises the interrupt line
    pub const IRQ_ENABLE: u8 = 0x20;

    /// Counting, interrupt line inactive
    pub const IRQ_DISABLED: Self = Self(0x81);
    /// Counting, interrupt on zero detect
    pub const IRQ_ENABLED: Self = Self(0xA1);

    /// Wraps raw register bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw register bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns this control value with the counter stopped
    pub const fn halted(self) -> Self {
        Self(self.0 & !Self::ENABLE)
    }

    /// Returns true if the counter runs
    pub const fn is_running(self) -> bool {
        self.0 & Self::ENABLE != 0
    }

    /// Returns true if zero detect raises the interrupt line
    pub const fn irq_enabled(self) -> bool {
        self.0 & Self::IRQ_ENABLE != 0
    }
}

/// One read of the three counter bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Bits 23..16
    pub high: u8,
    /// Bits 15..8
    pub mid: u8,
    /// Bits 7..0
    pub low: u8,
}

impl CounterSnapshot {
    /// Joins the three bytes into the 24-bit count
    pub fn value(&self) -> u32 {
        (u32::from(self.high) << 16) | (u32::from(self.mid) << 8) | u32::from(self.low)
    }
}

/// Register facade over a module window
#[derive(Debug)]
pub struct M99Registers<A: RegisterAccess> {
    access: A,
}

impl<A: RegisterAccess> M99Registers<A> {
    /// Status bit written back to reset the timer after a preload change
    const TS_RESET: u16 = 0x01;
    /// Status bits written back to acknowledge an interrupt
    const TS_CLEAR_ALL: u16 = 0xFF;

    /// Wraps an access implementation
    pub fn new(access: A) -> Self {
        Self { access }
    }

    /// Returns the underlying access
    pub fn access(&self) -> &A {
        &self.access
    }

    /// Returns the underlying access mutably
    pub fn access_mut(&mut self) -> &mut A {
        &mut self.access
    }

    /// Consumes the facade, returning the underlying access
    pub fn into_inner(self) -> A {
        self.access
    }

    /// Puts the parallel ports into their reset configuration
    ///
    /// Port A drives the LEDs (all outputs, pattern 0xAA), port B is input,
    /// and the timer vector is left at its reset value.
    pub fn init_ports(&mut self) {
        self.write_byte(offsets::PGC, 0x00);
        self.write_byte(offsets::PAD, 0xAA);
        self.write_byte(offsets::PADD, 0xFF);
        self.write_byte(offsets::PBDD, 0x00);
        self.write_byte(offsets::PAC, 0x00);
        self.write_byte(offsets::PBC, 0x00);
        self.write_byte(offsets::TIV, 0x0F);
    }

    /// Reads the counter low byte
    pub fn counter_low(&mut self) -> u8 {
        self.read_byte(offsets::CNTL)
    }

    /// Reads the counter middle byte
    pub fn counter_mid(&mut self) -> u8 {
        self.read_byte(offsets::CNTM)
    }

    /// Reads the counter high byte
    pub fn counter_high(&mut self) -> u8 {
        self.read_byte(offsets::CNTH)
    }

    /// Writes a 24-bit preload value, low byte first
    ///
    /// Bits above 23 are discarded.
    pub fn write_preload(&mut self, value: u32) {
        let [low, mid, high, _] = value.to_le_bytes();
        self.write_byte(offsets::CPL, low);
        self.write_byte(offsets::CPM, mid);
        self.write_byte(offsets::CPH, high);
    }

    /// Reads back the 24-bit preload value
    pub fn read_preload(&mut self) -> u32 {
        let low = self.read_byte(offsets::CPL);
        let mid = self.read_byte(offsets::CPM);
        let high = self.read_byte(offsets::CPH);
        u32::from_le_bytes([low, mid, high, 0])
    }

    /// Reads the timer control register
    pub fn timer_control(&mut self) -> TimerControl {
        TimerControl::from_bits(self.read_byte(offsets::TC))
    }

    /// Writes the timer control register
    pub fn set_timer_control(&mut self, control: TimerControl) {
        self.write_byte(offsets::TC, control.bits());
    }

    /// Returns true if the timer reports a pending interrupt
    pub fn irq_pending(&mut self) -> bool {
        self.read_byte(offsets::TS) != 0
    }

    /// Acknowledges a pending interrupt
    pub fn clear_irq(&mut self) {
        self.access.write_d16(offsets::TS, Self::TS_CLEAR_ALL);
    }

    /// Resets the timer status after a preload change
    pub fn reset_status(&mut self) {
        self.access.write_d16(offsets::TS, Self::TS_RESET);
    }

    /// Drives the diagnostic LEDs on port A
    pub fn set_leds(&mut self, pattern: u8) {
        self.write_byte(offsets::PAD, pattern);
    }

    /// Reads the SRAM word at byte `offset`
    pub fn sram_read(&mut self, offset: usize) -> u16 {
        debug_assert!(offset + 2 <= offsets::SRAM_SIZE, "SRAM offset 0x{offset:02X}");
        self.access.read_d16(offsets::SRAM_BASE + offset)
    }

    /// Writes the SRAM word at byte `offset`
    pub fn sram_write(&mut self, offset: usize, value: u16) {
        debug_assert!(offset + 2 <= offsets::SRAM_SIZE, "SRAM offset 0x{offset:02X}");
        self.access.write_d16(offsets::SRAM_BASE + offset, value);
    }

    /// Fills `len` bytes of SRAM starting at `offset` with `value` words
    pub fn sram_fill(&mut self, offset: usize, len: usize, value: u16) {
        for word in (offset..offset + len).step_by(2) {
            self.sram_write(word, value);
        }
    }

    /// Copies SRAM starting at its base into `dst`
    ///
    /// An odd trailing byte takes the high byte of its word.
    pub fn sram_read_block(&mut self, dst: &mut [u8]) {
        let mut chunks = dst.chunks_exact_mut(2);
        let mut offset = 0;
        for pair in &mut chunks {
            pair.copy_from_slice(&self.sram_read(offset).to_be_bytes());
            offset += 2;
        }
        if let [last] = chunks.into_remainder() {
            *last = self.sram_read(offset).to_be_bytes()[0];
        }
    }

    /// Copies `src` into SRAM starting at its base
    ///
    /// An odd trailing byte replaces only the high byte of its word.
    pub fn sram_write_block(&mut self, src: &[u8]) {
        let mut chunks = src.chunks_exact(2);
        let mut offset = 0;
        for pair in &mut chunks {
            self.sram_write(offset, u16::from_be_bytes([pair[0], pair[1]]));
            offset += 2;
        }
        if let [last] = chunks.remainder() {
            let low = self.sram_read(offset).to_be_bytes()[1];
            self.sram_write(offset, u16::from_be_bytes([*last, low]));
        }
    }

    fn read_byte(&mut self, offset: usize) -> u8 {
        (self.access.read_d16(offset) & 0xFF) as u8
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self.access.write_d16(offset, u16::from(value));
    }
}
