//! Register access abstraction
//!
//! Device registers and device-local memory are reached through 16-bit
//! accesses at byte offsets inside the device's address window. Only the
//! data width is fixed here; what each offset means belongs to the device's
//! register facade.

/// 16-bit register access within one device address window
///
/// ## Implementation Notes
///
/// Implementations must guarantee:
/// - every access reaches the device in program order
/// - `offset` is a byte offset from the window base
/// - accesses complete synchronously before returning
pub trait RegisterAccess {
    /// Reads the 16-bit word at `offset`
    fn read_d16(&mut self, offset: usize) -> u16;

    /// Writes the 16-bit word at `offset`
    fn write_d16(&mut self, offset: usize, value: u16);
}

impl<A: RegisterAccess + ?Sized> RegisterAccess for Box<A> {
    fn read_d16(&mut self, offset: usize) -> u16 {
        (**self).read_d16(offset)
    }

    fn write_d16(&mut self, offset: usize, value: u16) {
        (**self).write_d16(offset, value)
    }
}
