//! # Mailbox Rings
//!
//! The SRAM holds two rings of equal size back to back: the read side at
//! `[0, C)` and the write side at `[C, 2C)`. Each ring has one cursor shared
//! by direct calls and interrupt transfers; it moves one 16-bit unit at a
//! time and wraps to the start of its own half.

use hal::RegisterAccess;
use hal_m99::M99Registers;

/// Fill pattern for the write ring at start-up
pub const WRITE_FILL: u16 = 0xA55A;

/// One circular SRAM region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxRing {
    base: usize,
    capacity: usize,
    cursor: usize,
}

impl MailboxRing {
    /// Creates the read-side ring of `capacity` bytes
    pub fn read_side(capacity: usize) -> Self {
        Self::at(0, capacity)
    }

    /// Creates the write-side ring of `capacity` bytes
    pub fn write_side(capacity: usize) -> Self {
        Self::at(capacity, capacity)
    }

    fn at(base: usize, capacity: usize) -> Self {
        Self {
            base,
            capacity,
            cursor: base,
        }
    }

    /// Returns the first SRAM byte of the ring
    pub fn base(&self) -> usize {
        self.base
    }

    /// Returns the ring size in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the SRAM byte offset of the next unit
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Reads the unit at the cursor and advances
    pub fn read<A: RegisterAccess>(&mut self, regs: &mut M99Registers<A>) -> u16 {
        let unit = regs.sram_read(self.cursor);
        self.advance();
        unit
    }

    /// Writes `unit` at the cursor and advances
    pub fn write<A: RegisterAccess>(&mut self, regs: &mut M99Registers<A>, unit: u16) {
        regs.sram_write(self.cursor, unit);
        self.advance();
    }

    /// Writes 0, 1, 2, ... into consecutive units of the ring
    pub fn fill_sequence<A: RegisterAccess>(&self, regs: &mut M99Registers<A>) {
        for (index, offset) in (self.base..self.base + self.capacity).step_by(2).enumerate() {
            regs.sram_write(offset, index as u16);
        }
    }

    /// Writes `value` into every unit of the ring
    pub fn fill<A: RegisterAccess>(&self, regs: &mut M99Registers<A>, value: u16) {
        regs.sram_fill(self.base, self.capacity, value);
    }

    fn advance(&mut self) {
        self.cursor += 2;
        if self.cursor >= self.base + self.capacity {
            self.cursor = self.base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_hw::SimBoard;

    #[test]
    fn test_halves() {
        let read = MailboxRing::read_side(64);
        let write = MailboxRing::write_side(64);
        assert_eq!((read.base(), read.cursor()), (0, 0));
        assert_eq!((write.base(), write.cursor()), (64, 64));
    }

    #[test]
    fn test_prefill() {
        let board = SimBoard::new();
        let mut regs = M99Registers::new(board.clone());
        MailboxRing::read_side(8).fill_sequence(&mut regs);
        MailboxRing::write_side(8).fill(&mut regs, WRITE_FILL);

        let words: Vec<u16> = (0..16).step_by(2).map(|o| board.sram_word(o)).collect();
        assert_eq!(words, [0, 1, 2, 3, 0xA55A, 0xA55A, 0xA55A, 0xA55A]);
    }

    #[test]
    fn test_cursor_wraps_within_half() {
        let mut regs = M99Registers::new(SimBoard::new());
        let mut ring = MailboxRing::write_side(8);

        for unit in 0..4 {
            ring.write(&mut regs, unit);
        }
        assert_eq!(ring.cursor(), 8);

        ring.write(&mut regs, 0xFFFF);
        assert_eq!(ring.cursor(), 10);
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let board = SimBoard::new();
        let mut regs = M99Registers::new(board.clone());
        let mut ring = MailboxRing::read_side(8);
        MailboxRing::read_side(8).fill_sequence(&mut regs);

        let first: Vec<u16> = (0..4).map(|_| ring.read(&mut regs)).collect();
        assert_eq!(first, [0, 1, 2, 3]);
        assert_eq!(ring.cursor(), 0);
    }

    #[test]
    fn test_reads_back_what_the_same_ring_wrote() {
        let board = SimBoard::new();
        let mut regs = M99Registers::new(board.clone());
        for mut ring in [MailboxRing::read_side(16), MailboxRing::write_side(16)] {
            // two laps: the second overwrites the first
            for unit in 0..16u16 {
                ring.write(&mut regs, 0x4000 + unit);
            }
            assert_eq!(ring.cursor(), ring.base());

            let back: Vec<u16> = (0..8).map(|_| ring.read(&mut regs)).collect();
            assert_eq!(back, (0x4008..0x4010).collect::<Vec<u16>>());
            assert_eq!(ring.cursor(), ring.base());
        }
        // each ring stayed inside its own half
        assert_eq!(board.sram_word(14), 0x400F);
        assert_eq!(board.sram_word(16), 0x4008);
        assert_eq!(board.sram_word(32), 0);
    }
}
