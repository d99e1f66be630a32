//! In-memory stream buffer
//!
//! Stands in for the OS buffer manager in buffered transfer modes. The
//! queue sits behind its own short lock. Process-side calls can wait for a
//! configured time for data or space; they poll with the lock released, so
//! the interrupt side keeps moving units while they wait. With no wait set
//! they report [`StreamError::Timeout`] straight away.

use hal::{BufferMode, StreamBuffer, StreamError};
use spin::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Which way data flows through a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    /// Interrupt side fills, process side reads
    Input,
    /// Process side writes, interrupt side drains
    Output,
}

#[derive(Debug, Default)]
struct Queue {
    units: VecDeque<u16>,
    staging: Vec<u16>,
    lost: usize,
}

/// Bounded queue of 16-bit units
#[derive(Debug)]
pub struct SimStreamBuffer {
    mode: BufferMode,
    direction: StreamDirection,
    capacity: usize,
    wait: Duration,
    queue: Mutex<Queue>,
}

impl SimStreamBuffer {
    /// Creates an input buffer holding up to `capacity` units
    pub fn input(mode: BufferMode, capacity: usize) -> Self {
        Self::new(mode, StreamDirection::Input, capacity)
    }

    /// Creates an output buffer holding up to `capacity` units
    pub fn output(mode: BufferMode, capacity: usize) -> Self {
        Self::new(mode, StreamDirection::Output, capacity)
    }

    fn new(mode: BufferMode, direction: StreamDirection, capacity: usize) -> Self {
        Self {
            mode,
            direction,
            capacity,
            wait: Duration::ZERO,
            queue: Mutex::new(Queue {
                units: VecDeque::with_capacity(capacity),
                ..Queue::default()
            }),
        }
    }

    /// Lets `read` and `write` wait up to `wait` for data or space
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Returns the buffer direction
    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    /// Returns the number of queued units
    pub fn len(&self) -> usize {
        self.queue.lock().units.len()
    }

    /// Returns true if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.lock().units.is_empty()
    }

    /// Returns the number of units dropped to make room
    pub fn lost(&self) -> usize {
        self.queue.lock().lost
    }

    fn push(&self, queue: &mut Queue, unit: u16) -> bool {
        match self.mode {
            BufferMode::Current => {
                queue.lost += queue.units.len();
                queue.units.clear();
            }
            BufferMode::RingOverwrite if queue.units.len() == self.capacity => {
                queue.units.pop_front();
                queue.lost += 1;
            }
            _ if queue.units.len() == self.capacity => return false,
            _ => {}
        }
        queue.units.push_back(unit);
        true
    }

    /// Retries `attempt` with the queue unlocked in between until it
    /// returns a result or the wait runs out
    fn poll<T>(
        &self,
        mut attempt: impl FnMut(&mut Queue) -> Option<T>,
    ) -> Result<T, StreamError> {
        let deadline = Instant::now() + self.wait;
        loop {
            {
                let mut queue = self.queue.lock();
                if let Some(done) = attempt(&mut *queue) {
                    return Ok(done);
                }
            }
            if Instant::now() >= deadline {
                return Err(StreamError::Timeout);
            }
            std::thread::yield_now();
        }
    }
}

impl StreamBuffer for SimStreamBuffer {
    fn mode(&self) -> BufferMode {
        self.mode
    }

    fn next_buf(&self, units: usize, transfer: &mut dyn FnMut(&mut [u16])) -> bool {
        let Some(mut queue) = self.queue.try_lock() else {
            return false;
        };
        let mut staged = std::mem::take(&mut queue.staging);
        staged.clear();
        match self.direction {
            StreamDirection::Input => {
                let full = queue.units.len() + units > self.capacity;
                if full && self.mode == BufferMode::Ring {
                    queue.staging = staged;
                    return false;
                }
                staged.resize(units, 0);
                transfer(staged.as_mut_slice());
                for &unit in &staged {
                    self.push(&mut *queue, unit);
                }
            }
            StreamDirection::Output => {
                if queue.units.len() < units {
                    queue.staging = staged;
                    return false;
                }
                staged.extend(queue.units.drain(..units));
                transfer(staged.as_mut_slice());
            }
        }
        queue.staging = staged;
        true
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.direction != StreamDirection::Input {
            return Err(StreamError::NoBuffer);
        }
        self.poll(|queue| {
            if queue.units.is_empty() {
                return None;
            }
            let mut done = 0;
            for pair in buf.chunks_exact_mut(2) {
                let Some(unit) = queue.units.pop_front() else {
                    break;
                };
                pair.copy_from_slice(&unit.to_be_bytes());
                done += 2;
            }
            Some(done)
        })
    }

    fn write(&self, buf: &[u8]) -> Result<usize, StreamError> {
        if self.direction != StreamDirection::Output {
            return Err(StreamError::NoBuffer);
        }
        self.poll(|queue| {
            let mut done = 0;
            for pair in buf.chunks_exact(2) {
                if !self.push(queue, u16::from_be_bytes([pair[0], pair[1]])) {
                    break;
                }
                done += 2;
            }
            (done > 0 || buf.is_empty()).then_some(done)
        })
    }
}
