//! Register access implementations for the M99 address window
//!
//! This module provides a real memory-mapped implementation of
//! [`RegisterAccess`] and a scripted fake for facade tests.
//!
//! ## Safety
//!
//! Memory-mapped access is inherently unsafe as it directly touches hardware.
//! Care must be taken to:
//! - Only map the module's own address window
//! - Keep every offset inside that window
//! - Use volatile accesses so the compiler never merges or reorders them
//!
//! The `MmioAccess` implementation isolates all unsafe code to its
//! constructor and two small volatile accessors.

use core::ptr::NonNull;
use hal::RegisterAccess;

/// Size of the module's address window in bytes
pub const WINDOW_SIZE: usize = 0x100;

/// Memory-mapped access to a module address window
///
/// ## Example
///
/// ```rust,ignore
/// let mut access = unsafe { MmioAccess::new(window_base) };
/// let status = access.read_d16(0xB4); // timer status
/// ```
#[derive(Debug)]
pub struct MmioAccess {
    base: NonNull<u8>,
}

// SAFETY: The window is exclusively owned by one driver instance, which
// serializes all access behind its device lock.
unsafe impl Send for MmioAccess {}

impl MmioAccess {
    /// Creates an accessor for the window starting at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to a mapped, device-backed window of at least
    /// [`WINDOW_SIZE`] bytes that nothing else accesses for the lifetime
    /// of the returned value.
    pub unsafe fn new(base: NonNull<u8>) -> Self {
        Self { base }
    }

    #[inline]
    fn word_ptr(&self, offset: usize) -> *mut u16 {
        assert!(
            offset + 1 < WINDOW_SIZE && offset % 2 == 0,
            "MmioAccess: offset 0x{offset:02X} outside window"
        );
        // SAFETY: offset is checked against the window size above and the
        // constructor's contract guarantees the window is mapped.
        unsafe { self.base.as_ptr().add(offset).cast::<u16>() }
    }
}

impl RegisterAccess for MmioAccess {
    #[inline]
    fn read_d16(&mut self, offset: usize) -> u16 {
        // SAFETY: word_ptr only yields aligned addresses inside the mapped window.
        unsafe { core::ptr::read_volatile(self.word_ptr(offset)) }
    }

    #[inline]
    fn write_d16(&mut self, offset: usize, value: u16) {
        // SAFETY: word_ptr only yields aligned addresses inside the mapped window.
        unsafe { core::ptr::write_volatile(self.word_ptr(offset), value) }
    }
}

/// Fake register access for facade tests
///
/// Allows scripted reads and captures writes for verification.
///
/// ## Example
///
/// ```rust
/// use hal::RegisterAccess;
/// use hal_m99::access::FakeRegisterAccess;
///
/// let mut access = FakeRegisterAccess::new();
/// access.script_read(0xB4, 0x01); // timer status: zero detected
///
/// assert_eq!(access.read_d16(0xB4), 0x01);
/// access.write_d16(0xB4, 0xFF);
///
/// assert_eq!(access.remaining_reads(), 0);
/// assert_eq!(access.writes(), &[(0xB4, 0xFF)]);
/// ```
#[derive(Debug, Default)]
pub struct FakeRegisterAccess {
    /// Scripted read values: (offset, value)
    read_script: Vec<(usize, u16)>,
    /// Current read index
    read_index: usize,
    /// Captured write operations: (offset, value)
    writes: Vec<(usize, u16)>,
}

impl FakeRegisterAccess {
    /// Creates a fake with an empty script
    pub fn new() -> Self {
        Self {
            read_script: Vec::new(),
            read_index: 0,
            writes: Vec::new(),
        }
    }

    /// Scripts a read: the next read must target `offset` and yields `value`
    pub fn script_read(&mut self, offset: usize, value: u16) {
        self.read_script.push((offset, value));
    }

    /// Scripts multiple reads
    pub fn script_reads(&mut self, reads: &[(usize, u16)]) {
        self.read_script.extend_from_slice(reads);
    }

    /// Returns the number of scripted reads remaining
    pub fn remaining_reads(&self) -> usize {
        self.read_script.len() - self.read_index
    }

    /// Returns all captured writes
    pub fn writes(&self) -> &[(usize, u16)] {
        &self.writes
    }

    /// Clears all captured writes
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl RegisterAccess for FakeRegisterAccess {
    fn read_d16(&mut self, offset: usize) -> u16 {
        if self.read_index >= self.read_script.len() {
            panic!(
                "FakeRegisterAccess: No scripted read for offset 0x{:02X} (read_index={}, script_len={})",
                offset,
                self.read_index,
                self.read_script.len()
            );
        }

        let (expected, value) = self.read_script[self.read_index];
        if offset != expected {
            panic!(
                "FakeRegisterAccess: Offset mismatch at read_index={}: expected 0x{:02X}, got 0x{:02X}",
                self.read_index, expected, offset
            );
        }

        self.read_index += 1;
        value
    }

    fn write_d16(&mut self, offset: usize, value: u16) {
        self.writes.push((offset, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_access_script_reads() {
        let mut access = FakeRegisterAccess::new();
        access.script_reads(&[(0xB2, 0x10), (0xB0, 0x20), (0xAE, 0x30)]);

        assert_eq!(access.remaining_reads(), 3);
        assert_eq!(access.read_d16(0xB2), 0x10);
        assert_eq!(access.read_d16(0xB0), 0x20);
        assert_eq!(access.read_d16(0xAE), 0x30);
        assert_eq!(access.remaining_reads(), 0);
    }

    #[test]
    fn test_fake_access_captures_writes() {
        let mut access = FakeRegisterAccess::new();
        access.write_d16(0xAA, 0x90);
        access.write_d16(0xA8, 0xD0);

        assert_eq!(access.writes(), &[(0xAA, 0x90), (0xA8, 0xD0)]);
        access.clear_writes();
        assert!(access.writes().is_empty());
    }

    #[test]
    #[should_panic(expected = "No scripted read")]
    fn test_fake_access_panics_on_unscripted_read() {
        let mut access = FakeRegisterAccess::new();
        access.read_d16(0xB4);
    }

    #[test]
    #[should_panic(expected = "Offset mismatch")]
    fn test_fake_access_panics_on_wrong_offset() {
        let mut access = FakeRegisterAccess::new();
        access.script_read(0xB4, 0x01);
        access.read_d16(0xB2);
    }

    #[test]
    fn test_mmio_access_on_backing_memory() {
        let mut window = vec![0u16; WINDOW_SIZE / 2];
        let base = NonNull::new(window.as_mut_ptr().cast::<u8>()).unwrap();
        // SAFETY: the vector outlives `access` and spans the whole window.
        let mut access = unsafe { MmioAccess::new(base) };

        access.write_d16(0x90, 0x00AA);
        assert_eq!(access.read_d16(0x90), 0x00AA);
        drop(access);
        assert_eq!(window[0x90 / 2], 0x00AA);
    }

    #[test]
    #[should_panic(expected = "outside window")]
    fn test_mmio_access_rejects_out_of_window_offset() {
        let mut window = vec![0u16; WINDOW_SIZE / 2];
        let base = NonNull::new(window.as_mut_ptr().cast::<u8>()).unwrap();
        // SAFETY: the vector outlives `access` and spans the whole window.
        let mut access = unsafe { MmioAccess::new(base) };
        access.read_d16(WINDOW_SIZE);
    }
}
