//! Streaming buffer abstraction
//!
//! Buffered transfer modes put a queue between the interrupt handler and
//! process-context readers/writers. The queue owns backpressure, timeouts
//! and the buffering policy; the driver only asks for the next buffer from
//! interrupt context and reads or writes through it from process context.

use thiserror::Error;

/// Errors raised by a streaming buffer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// No buffer is configured for this direction
    #[error("No buffer configured")]
    NoBuffer,

    /// Timed out waiting for data or space
    #[error("Buffer timeout")]
    Timeout,

    /// Data was lost because the buffer overflowed
    #[error("Buffer overflow")]
    Overflow,
}

/// How a direction's data moves between the device and the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// No queue; callers talk to the hardware directly
    UserControl,
    /// Bounded ring, writers wait when full
    Ring,
    /// Bounded ring, oldest data is overwritten when full
    RingOverwrite,
    /// Only the most recent buffer is kept
    Current,
}

/// A queued buffer for one transfer direction
///
/// The interrupt side calls [`next_buf`](StreamBuffer::next_buf); the
/// process side calls [`read`](StreamBuffer::read) or
/// [`write`](StreamBuffer::write).
///
/// Implementations synchronize themselves. A process-side call that waits
/// for data or space must only hold the queue's lock while it mutates the
/// queue, never across the wait, so the interrupt side can keep filling or
/// draining it in the meantime.
pub trait StreamBuffer: Send + Sync {
    /// Returns the buffering mode
    fn mode(&self) -> BufferMode;

    /// Hands the next buffer of `units` 16-bit units to `transfer`
    ///
    /// For an input buffer the slice is space to fill; for an output buffer
    /// it holds data to drain. The buffer is marked ready once `transfer`
    /// returns. Returns false without calling `transfer` when no buffer is
    /// ready or the queue is busy.
    ///
    /// Called from interrupt context; must not block.
    fn next_buf(&self, units: usize, transfer: &mut dyn FnMut(&mut [u16])) -> bool;

    /// Copies queued input into `buf`, returning the number of bytes read
    fn read(&self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Queues output from `buf`, returning the number of bytes accepted
    fn write(&self, buf: &[u8]) -> Result<usize, StreamError>;
}

/// Placeholder for a direction with no queue
///
/// Always reports [`BufferMode::UserControl`] and never hands out buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBuffer;

impl StreamBuffer for NoBuffer {
    fn mode(&self) -> BufferMode {
        BufferMode::UserControl
    }

    fn next_buf(&self, _units: usize, _transfer: &mut dyn FnMut(&mut [u16])) -> bool {
        false
    }

    fn read(&self, _buf: &mut [u8]) -> Result<usize, StreamError> {
        Err(StreamError::NoBuffer)
    }

    fn write(&self, _buf: &[u8]) -> Result<usize, StreamError> {
        Err(StreamError::NoBuffer)
    }
}
