//! # Driver Debug Log
//!
//! This crate implements structured debug logging for low-level drivers.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! A driver records [`LogEntry`] values into a [`DebugLog`] it owns; whoever
//! owns the driver drains them.
//!
//! Recording never blocks. From interrupt context a contended log drops the
//! entry and counts the drop instead of waiting.

use spin::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Default number of entries kept before the oldest is discarded
pub const DEFAULT_CAPACITY: usize = 256;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Per-interrupt detail
    Trace,
    /// Parameters and intermediate values
    Debug,
    /// Entry points
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
    /// Nothing is recorded
    Off,
}

impl LogLevel {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Warn,
            4 => Self::Error,
            _ => Self::Off,
        }
    }
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Recording component
    pub source: &'static str,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, source: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            source,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: &'static str, value: impl ToString) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// Returns the value of the first field named `key`
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Bounded in-memory log with a runtime threshold
#[derive(Debug)]
pub struct DebugLog {
    threshold: AtomicU8,
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
    dropped: AtomicUsize,
}

impl DebugLog {
    /// Creates a log recording `threshold` and above
    pub fn new(threshold: LogLevel) -> Self {
        Self::with_capacity(threshold, DEFAULT_CAPACITY)
    }

    /// Creates a log keeping at most `capacity` entries
    pub fn with_capacity(threshold: LogLevel, capacity: usize) -> Self {
        Self {
            threshold: AtomicU8::new(threshold as u8),
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Returns the current threshold
    pub fn threshold(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    /// Changes the threshold
    pub fn set_threshold(&self, threshold: LogLevel) {
        self.threshold.store(threshold as u8, Ordering::Relaxed);
    }

    /// Returns true if entries at `level` are recorded
    ///
    /// Check this before building an entry on a hot path.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.threshold()
    }

    /// Records an entry from process context
    pub fn record(&self, entry: LogEntry) {
        if !self.enabled(entry.level) {
            return;
        }
        let mut entries = self.entries.lock();
        self.push(&mut entries, entry);
    }

    /// Records an entry from interrupt context
    ///
    /// Drops the entry if the log is held elsewhere.
    pub fn record_nowait(&self, entry: LogEntry) {
        if !self.enabled(entry.level) {
            return;
        }
        match self.entries.try_lock() {
            Some(mut entries) => self.push(&mut entries, entry),
            None => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Removes and returns every recorded entry, oldest first
    pub fn drain(&self) -> Vec<LogEntry> {
        self.entries.lock().drain(..).collect()
    }

    /// Returns the number of entries lost to contention or overflow
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, entries: &mut VecDeque<LogEntry>, entry: LogEntry) {
        if self.capacity == 0 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if entries.len() == self.capacity {
            entries.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        entries.push_back(entry);
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new(LogLevel::Off)
    }
}
